//! Catalog product MCP server.
//!
//! Exposes the `get_product_by_id` tool over two transports:
//! - stdio (one server instance for the lifetime of the pipe)
//! - streamable HTTP (stateless; a fresh server value per inbound request)
//!
//! JSON:API access and flattening live in `catalog-jsonapi`; this crate only wires them to MCP.

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod stdio;
pub mod tools;

pub use error::{Result, ServerError};
pub use tools::{GET_PRODUCT_BY_ID, ProductEnvelope, ProductServer};
