//! Command line + config file handling.
//!
//! Precedence: CLI flag / environment variable, then the optional YAML config file.

use crate::error::{Result, ServerError};
use crate::logging::LogFormat;
use catalog_jsonapi::JsonApiClient;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "catalog-mcp", version, about = "Catalog product lookup as an MCP tool")]
pub struct Cli {
    #[command(flatten)]
    pub upstream: UpstreamArgs,

    /// Log level / filter directive (overridden by `RUST_LOG` when set)
    #[arg(long, env = "CATALOG_MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "CATALOG_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve MCP over stdin/stdout
    Stdio,
    /// Serve MCP over streamable HTTP (`/mcp`) with a `/health` endpoint
    Http(HttpArgs),
}

#[derive(Debug, Args)]
pub struct HttpArgs {
    /// Address to bind
    #[arg(long, env = "CATALOG_MCP_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, Args)]
pub struct UpstreamArgs {
    /// Optional YAML config file (`baseUrl`, `bearerToken`)
    #[arg(long, env = "CATALOG_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON:API base URL, e.g. `https://cms.example.com/jsonapi`
    #[arg(long, env = "CATALOG_JSONAPI_BASE_URL")]
    pub base_url: Option<String>,

    /// Static bearer token sent as `Authorization: Bearer <token>`
    #[arg(long, env = "CATALOG_JSONAPI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// On-disk configuration (all keys optional).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Resolved upstream settings.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for UpstreamSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamSettings")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl UpstreamSettings {
    /// Build the shared JSON:API client for these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::JsonApi`] if the base URL is not a usable `http(s)` URL.
    pub fn client(&self) -> Result<JsonApiClient> {
        Ok(JsonApiClient::new(&self.base_url, self.bearer_token.clone())?)
    }
}

/// Load a YAML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML for [`FileConfig`].
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ServerError::Config(format!("failed to read config file '{}': {e}", path.display()))
    })?;
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(&raw)?)
}

impl UpstreamArgs {
    /// Merge CLI/env values over the optional config file.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if no base URL is configured anywhere, or if the config
    /// file cannot be loaded.
    pub fn resolve(&self) -> Result<UpstreamSettings> {
        let file = match &self.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };
        merge(self.base_url.clone(), self.token.clone(), file)
    }
}

fn merge(
    base_url: Option<String>,
    token: Option<String>,
    file: FileConfig,
) -> Result<UpstreamSettings> {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let base_url = non_blank(base_url)
        .or_else(|| non_blank(file.base_url))
        .ok_or_else(|| {
            ServerError::Config(
                "JSON:API base URL is required (--base-url, CATALOG_JSONAPI_BASE_URL, or baseUrl in --config)"
                    .to_string(),
            )
        })?;
    let bearer_token = non_blank(token).or_else(|| non_blank(file.bearer_token));

    Ok(UpstreamSettings {
        base_url,
        bearer_token,
    })
}
