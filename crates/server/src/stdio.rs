//! Stdio host: one server instance for the lifetime of the pipe.

use crate::error::{Result, ServerError};
use crate::tools::ProductServer;
use catalog_jsonapi::JsonApiClient;
use rmcp::ServiceExt as _;
use rmcp::transport::stdio;

/// Serve MCP over stdin/stdout until the client closes the pipe.
///
/// # Errors
///
/// Returns an error if the MCP handshake fails or the service task terminates abnormally.
pub async fn serve(client: JsonApiClient) -> Result<()> {
    let service = ProductServer::new(client)
        .serve(stdio())
        .await
        .map_err(|e| ServerError::Startup(format!("failed to start MCP server over stdio: {e}")))?;

    let reason = service
        .waiting()
        .await
        .map_err(|e| ServerError::Runtime(format!("MCP server terminated unexpectedly: {e}")))?;
    tracing::info!(?reason, "stdio host stopped");
    Ok(())
}
