use anyhow::Context as _;
use catalog_jsonapi::redact::redact_url;
use catalog_mcp::config::{Cli, Command};
use catalog_mcp::{http, logging, stdio};
use clap::Parser as _;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let settings = cli.upstream.resolve()?;
    let client = settings.client().context("configure JSON:API upstream")?;
    tracing::info!(
        base_url = %redact_url(client.base_url()),
        bearer_token = client.has_bearer_token(),
        "JSON:API upstream configured"
    );

    match cli.command {
        Command::Stdio => stdio::serve(client).await?,
        Command::Http(args) => {
            let listener = TcpListener::bind(args.bind)
                .await
                .with_context(|| format!("bind {}", args.bind))?;
            let shutdown = CancellationToken::new();
            tokio::spawn(http::cancel_on_shutdown_signal(shutdown.clone()));
            http::serve(listener, client, shutdown).await?;
        }
    }

    Ok(())
}
