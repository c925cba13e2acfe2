//! Single-request JSON:API client.
//!
//! One `GET` per call, with the relationship to embed passed as `include=...` so related
//! resources arrive in the same response. No retries and no timeout beyond the `reqwest`
//! default.

use crate::document::Document;
use crate::error::{JsonApiError, Result};
use crate::redact::redact_url;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use url::Url;

/// Media type required by JSON:API servers.
pub const JSONAPI_MIME_TYPE: &str = "application/vnd.api+json";

/// Path of the catalog item collection, relative to the configured base URL.
pub const ITEM_COLLECTION: &[&str] = &["node", "item"];

/// Relationship holding the item's size terms.
pub const SIZES_RELATIONSHIP: &str = "field_taglie";

/// Outcome of a fetch: either a decoded document or an explicit upstream 404.
#[derive(Debug)]
pub enum Fetched {
    Found(Box<Document>),
    NotFound,
}

#[derive(Clone)]
pub struct JsonApiClient {
    inner: Arc<JsonApiClientInner>,
}

struct JsonApiClientInner {
    base_url: Url,
    bearer_token: Option<String>,
    client: Client,
}

impl std::fmt::Debug for JsonApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonApiClient")
            .field("base_url", &redact_url(&self.inner.base_url))
            .field("bearer_token", &self.inner.bearer_token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl JsonApiClient {
    /// Build a client for the given base URL (e.g. `https://cms.example.com/jsonapi`).
    ///
    /// An empty bearer token is treated as no token. The resulting instance is immutable and
    /// safe to share across tasks.
    ///
    /// # Errors
    ///
    /// Returns [`JsonApiError::Config`] if the base URL does not parse, is not `http(s)`, or
    /// cannot carry a path.
    pub fn new(base_url: &str, bearer_token: Option<String>) -> Result<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| {
            JsonApiError::Config(format!("Invalid JSON:API base URL '{base_url}': {e}"))
        })?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(JsonApiError::Config(format!(
                "Invalid JSON:API base URL '{base_url}': unsupported scheme '{scheme}'"
            )));
        }
        if parsed.cannot_be_a_base() {
            return Err(JsonApiError::Config(format!(
                "Invalid JSON:API base URL '{base_url}': cannot be used as a base"
            )));
        }

        Ok(Self {
            inner: Arc::new(JsonApiClientInner {
                base_url: parsed,
                bearer_token: bearer_token.filter(|t| !t.is_empty()),
                client: Client::new(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    #[must_use]
    pub fn has_bearer_token(&self) -> bool {
        self.inner.bearer_token.is_some()
    }

    /// Build `<base>/<segments...>?include=<include>`. Each segment is percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`JsonApiError::Config`] if the base URL cannot carry a path.
    pub fn resource_url(&self, segments: &[&str], include: &str) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                JsonApiError::Config("JSON:API base URL cannot carry a path".to_string())
            })?;
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut().append_pair("include", include);
        Ok(url)
    }

    /// Fetch one resource, embedding the `include` relationship.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the request cannot be sent or the body cannot be read ([`JsonApiError::Request`])
    /// - upstream answers with a non-2xx status other than 404 ([`JsonApiError::Transport`])
    /// - the body is not a JSON:API document ([`JsonApiError::Decode`])
    pub async fn fetch_resource(&self, segments: &[&str], include: &str) -> Result<Fetched> {
        let url = self.resource_url(segments, include)?;
        let redacted = redact_url(&url);

        let mut request = self
            .inner
            .client
            .get(url)
            .header(ACCEPT, JSONAPI_MIME_TYPE);
        if let Some(token) = &self.inner.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(url = %redacted, status = status.as_u16(), "JSON:API response");

        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound);
        }
        if !status.is_success() {
            return Err(JsonApiError::Transport {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let document: Document = serde_json::from_slice(&bytes)
            .map_err(|e| JsonApiError::Decode(format!("{redacted}: {e}")))?;
        Ok(Fetched::Found(Box::new(document)))
    }
}
