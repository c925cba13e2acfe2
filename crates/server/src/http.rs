//! Streamable HTTP host.
//!
//! `/mcp` runs rmcp's streamable HTTP service in stateless mode: every inbound request gets a
//! fresh [`ProductServer`] value and no MCP session state outlives the response. `/health` is a
//! plain liveness probe.

use crate::error::{Result, ServerError};
use crate::tools::ProductServer;
use axum::routing::get;
use axum::{Json, Router};
use catalog_jsonapi::JsonApiClient;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const MCP_PATH: &str = "/mcp";
pub const HEALTH_PATH: &str = "/health";

/// Build the HTTP application.
pub fn router(client: JsonApiClient) -> Router {
    let mcp = StreamableHttpService::new(
        move || Ok(ProductServer::new(client.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );

    Router::new()
        .route(HEALTH_PATH, get(health))
        .nest_service(MCP_PATH, mcp)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests.
///
/// # Errors
///
/// Returns an error if the listener address cannot be read or the server fails.
pub async fn serve(
    listener: TcpListener,
    client: JsonApiClient,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, mcp = MCP_PATH, health = HEALTH_PATH, "HTTP host listening");

    axum::serve(listener, router(client))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ServerError::Runtime(format!("HTTP server failed: {e}")))?;

    tracing::info!("HTTP host stopped");
    Ok(())
}

/// Cancel `token` on Ctrl-C or (unix) SIGTERM.
pub async fn cancel_on_shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
    token.cancel();
}
