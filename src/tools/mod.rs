//! MCP tool inputs and validation helpers.
//!
//! This module contains the input types for the MCP tools that expose
//! Targetprocess operations, plus the checks every tool applies before a
//! request leaves the process.

mod inputs;
mod validate;

pub use inputs::*;
pub use validate::*;
