use anyhow::Context as _;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

pub use catalog_test_support::{FakeJsonApi, KillOnDrop};

pub fn pick_unused_port() -> anyhow::Result<u16> {
    catalog_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    catalog_test_support::wait_http_ok(url, timeout_dur).await
}

/// `catalog-mcp` with upstream configuration taken only from the given arguments.
pub fn server_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_catalog-mcp"));
    cmd.env_remove("CATALOG_JSONAPI_BASE_URL")
        .env_remove("CATALOG_JSONAPI_TOKEN")
        .env_remove("CATALOG_MCP_CONFIG")
        .env_remove("CATALOG_MCP_BIND");
    cmd
}

pub fn spawn_http_server(base_url: &str, port: u16) -> anyhow::Result<Child> {
    server_command()
        .arg("--base-url")
        .arg(base_url)
        .arg("--log-level")
        .arg("info")
        .arg("http")
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .stdout(Stdio::null())
        .spawn()
        .context("spawn catalog-mcp http")
}
