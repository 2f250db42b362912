//! Data models for the Targetprocess REST API.
//!
//! Entities are kept as ordered JSON field maps with typed accessors for the
//! handful of fields every entity shares, rather than one struct per type.

mod entity;
mod entity_type;
mod page;

pub use entity::*;
pub use entity_type::*;
pub use page::*;
