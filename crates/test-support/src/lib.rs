use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use std::net::TcpListener;
use std::process::Child;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status (2xx/3xx).
///
/// # Errors
///
/// Returns an error if the timeout elapses before the endpoint returns a success status.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// In-process JSON:API upstream serving `/jsonapi/node/item/{id}`.
///
/// - `missing` answers 404
/// - `broken` answers 500
/// - `anonymous` answers a document whose primary resource has no `id`
/// - any other id answers a `node--item` document with title `Shoe`, price `"49,90"` and size
///   references `t1`, `t2`, where only `t1` (`Large`) is included
pub struct FakeJsonApi {
    base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl FakeJsonApi {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> anyhow::Result<Self> {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/jsonapi/node/item/{id}", get(item))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind fake JSON:API upstream")?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        Ok(Self {
            base_url: format!("http://{addr}/jsonapi"),
            hits,
            shutdown_tx,
            handle,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of item requests served so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Stop the server and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task panicked or failed.
    pub async fn stop(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.handle
            .await
            .context("join fake JSON:API upstream")?
            .context("fake JSON:API upstream")?;
        Ok(())
    }
}

async fn item(State(hits): State<Arc<AtomicUsize>>, Path(id): Path<String>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    match id.as_str() {
        "missing" => return StatusCode::NOT_FOUND.into_response(),
        "broken" => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => {}
    }

    let body = if id == "anonymous" {
        json!({ "data": { "type": "node--item", "attributes": {} } })
    } else {
        item_document(&id)
    };
    (
        [(header::CONTENT_TYPE, "application/vnd.api+json")],
        body.to_string(),
    )
        .into_response()
}

fn item_document(id: &str) -> serde_json::Value {
    json!({
        "jsonapi": { "version": "1.0" },
        "data": {
            "id": id,
            "type": "node--item",
            "attributes": { "title": "Shoe", "field_prezzo": "49,90", "field_valuta": "EUR" },
            "relationships": {
                "field_taglie": {
                    "data": [
                        { "id": "t1", "type": "taxonomy_term--taglie" },
                        { "id": "t2", "type": "taxonomy_term--taglie" }
                    ]
                }
            }
        },
        "included": [
            { "id": "t1", "type": "taxonomy_term--taglie", "attributes": { "name": "Large" } }
        ]
    })
}
