//! The `get_product_by_id` tool and the rmcp `ServerHandler` that exposes it.

use catalog_jsonapi::fetcher::{ITEM_COLLECTION, SIZES_RELATIONSHIP};
use catalog_jsonapi::{Fetched, FlattenedProduct, JsonApiClient, JsonApiError, flatten};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    ToolAnnotations,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;

pub const GET_PRODUCT_BY_ID: &str = "get_product_by_id";

const GET_PRODUCT_BY_ID_DESCRIPTION: &str = "Fetch one catalog product by id. Returns a JSON \
envelope: {\"ok\":true,\"product\":{...}} with title, categoria, materiale, prezzo, valuta and \
resolved sizes (taglie), or {\"ok\":false,\"error\":\"not_found\",\"id\":...}.";

#[derive(Debug, Deserialize)]
struct GetProductArgs {
    id: String,
}

/// Tool result payload, serialized as the text content of the call result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProductEnvelope {
    Found {
        ok: bool,
        product: FlattenedProduct,
    },
    NotFound {
        ok: bool,
        error: &'static str,
        id: String,
    },
}

impl ProductEnvelope {
    #[must_use]
    pub fn found(product: FlattenedProduct) -> Self {
        Self::Found { ok: true, product }
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            ok: false,
            error: "not_found",
            id: id.into(),
        }
    }
}

/// MCP server exposing the product tool.
///
/// Holds only the shared, immutable JSON:API client, so constructing one per request is cheap.
#[derive(Debug, Clone)]
pub struct ProductServer {
    client: JsonApiClient,
}

impl ProductServer {
    #[must_use]
    pub fn new(client: JsonApiClient) -> Self {
        Self { client }
    }

    /// The tools this server advertises.
    #[must_use]
    pub fn tools() -> Vec<Tool> {
        vec![get_product_by_id_tool()]
    }

    /// Dispatch a tool call by name.
    ///
    /// # Errors
    ///
    /// Returns `invalid_params` for unknown tools and invalid arguments, and `internal_error`
    /// for upstream failures (see [`ProductServer::get_product_by_id`]).
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        if name != GET_PRODUCT_BY_ID {
            return Err(ErrorData::invalid_params(format!("unknown tool: {name}"), None));
        }

        let args = parse_args(arguments)?;
        let envelope = self.get_product_by_id(&args.id).await?;
        let text = serde_json::to_string(&envelope)
            .map_err(|e| ErrorData::internal_error(format!("serialize result: {e}"), None))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Fetch and flatten one product. An upstream 404 becomes a `not_found` envelope.
    ///
    /// # Errors
    ///
    /// Returns `internal_error` if the upstream request fails, returns a non-2xx status other
    /// than 404, or returns a document without a primary id/type.
    pub async fn get_product_by_id(&self, id: &str) -> Result<ProductEnvelope, ErrorData> {
        let segments: Vec<&str> = ITEM_COLLECTION
            .iter()
            .copied()
            .chain(std::iter::once(id))
            .collect();

        let fetched = self
            .client
            .fetch_resource(&segments, SIZES_RELATIONSHIP)
            .await
            .map_err(|e| upstream_error(id, &e))?;

        match fetched {
            Fetched::NotFound => {
                tracing::info!(product = %id, "product not found upstream");
                Ok(ProductEnvelope::not_found(id))
            }
            Fetched::Found(document) => {
                let product = flatten(&document).map_err(|e| upstream_error(id, &e))?;
                Ok(ProductEnvelope::found(product))
            }
        }
    }
}

fn parse_args(arguments: Option<JsonObject>) -> Result<GetProductArgs, ErrorData> {
    let Some(arguments) = arguments else {
        return Err(ErrorData::invalid_params(
            format!("missing arguments for {GET_PRODUCT_BY_ID}: expected {{ \"id\": string }}"),
            None,
        ));
    };
    let args: GetProductArgs = serde_json::from_value(Value::Object(arguments)).map_err(|e| {
        ErrorData::invalid_params(format!("invalid arguments for {GET_PRODUCT_BY_ID}: {e}"), None)
    })?;
    if args.id.is_empty() {
        return Err(ErrorData::invalid_params("id must be a non-empty string", None));
    }
    Ok(args)
}

fn upstream_error(id: &str, e: &JsonApiError) -> ErrorData {
    tracing::warn!(product = %id, error = %e, "product lookup failed");
    ErrorData::internal_error(e.to_string(), None)
}

fn get_product_by_id_tool() -> Tool {
    let schema = json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "minLength": 1,
                "description": "Product identifier (JSON:API resource id, usually a UUID)"
            }
        },
        "required": ["id"]
    });
    let schema_obj = schema.as_object().cloned().unwrap_or_else(JsonObject::new);

    let mut tool = Tool::new(
        GET_PRODUCT_BY_ID,
        GET_PRODUCT_BY_ID_DESCRIPTION,
        Arc::new(schema_obj),
    );
    tool.annotations = Some(read_only_annotations());
    tool
}

/// A single upstream `GET`: read-only, idempotent, and reaching an external system.
fn read_only_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: Some("Get product by id".to_string()),
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    }
}

impl ServerHandler for ProductServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Call {GET_PRODUCT_BY_ID} with {{\"id\": \"<product id>\"}}. The result text is \
                 JSON; check `ok` before reading `product`."
            )),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: Self::tools(),
            ..Default::default()
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            tracing::debug!(tool = %request.name, "tools/call");
            self.call(&request.name, request.arguments).await
        }
    }
}
