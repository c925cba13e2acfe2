//! JSON:API access + product flattening for the catalog MCP server.
//!
//! This crate is used by `catalog-mcp` (stdio and streamable HTTP hosts). It contains
//! **no** MCP protocol logic: it fetches one JSON:API document and turns it into a flat
//! product record.

pub mod document;
pub mod error;
pub mod fetcher;
pub mod flatten;
pub mod redact;

pub use document::Document;
pub use error::{JsonApiError, Result};
pub use fetcher::{Fetched, JsonApiClient};
pub use flatten::{FlattenedProduct, flatten, to_number_maybe};
