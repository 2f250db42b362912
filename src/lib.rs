//! # targetprocess-mcp
//!
//! An MCP (Model Context Protocol) server for Targetprocess, the agile
//! project-management tool.
//!
//! It exposes user stories, tasks, bugs, projects, iterations, workflow
//! states, comments, time tracking and assignments as MCP tools, so an AI
//! assistant can work a Targetprocess backlog through natural language.
//!
//! ## Features
//!
//! - **Queries**: typed filters for stories, tasks and bugs, plus raw
//!   Targetprocess `where` clauses for anything else
//! - **Writes**: create and partially update stories and tasks, change
//!   workflow state by name, log time, add comments
//! - **Identity**: resolve a user by id, email or the authenticated session,
//!   then list what is assigned to them
//! - **Security**: tokens and passwords are never logged and are redacted
//!   from every error returned to the assistant
//!
//! ## Architecture
//!
//! - [`config`] - Settings from the environment or a JSON config file
//! - [`error`] - Error kinds and the structured tool-error shape
//! - [`filter`] - Builder for Targetprocess filter expressions
//! - [`models`] - Generic entity records and resource types
//! - [`tp_client`] - HTTP client for the REST API
//! - [`server`] - MCP server implementation with tool routing
//! - [`tools`] - Tool input structs and validation
//!
//! ## Configuration
//!
//! - `TARGETPROCESS_URL`: instance URL, e.g. `https://acme.tpondemand.com`
//! - `TARGETPROCESS_TOKEN`: access token, or
//! - `TARGETPROCESS_USERNAME` / `TARGETPROCESS_PASSWORD`: basic credentials
//!
//! Missing values are read from `~/.config/targetprocess/config.json`
//! (override with `TARGETPROCESS_CONFIG`). `RUST_LOG` controls logging
//! (e.g. `targetprocess_mcp=debug`).
//!
//! ## Example
//!
//! ```ignore
//! use targetprocess_mcp::config::Config;
//! use targetprocess_mcp::filter::{Constraint, Filter};
//! use targetprocess_mcp::models::EntityType;
//! use targetprocess_mcp::tp_client::TpClient;
//!
//! async fn example() -> Result<(), targetprocess_mcp::error::TpError> {
//!     let config = Config::load()?;
//!     let client = TpClient::new(&config)?;
//!
//!     // Open stories in project 123
//!     let filter = Filter::new()
//!         .and(Constraint::eq("Project.Id", 123))
//!         .and(Constraint::eq("EntityState.Name", "Open"));
//!
//!     let page = client
//!         .list(EntityType::UserStory, filter.render().as_deref(), None, 10)
//!         .await?;
//!     for story in &page.items {
//!         println!("#{:?}: {:?}", story.id(), story.name());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod server;
pub mod tools;
pub mod tp_client;
