//! targetprocess-mcp - MCP server for Targetprocess
//!
//! This binary runs as an MCP server using stdio transport, allowing an MCP
//! client to work with Targetprocess through natural language.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `TARGETPROCESS_URL`: Base URL of your Targetprocess instance
//! - `TARGETPROCESS_TOKEN`: Access token, or
//! - `TARGETPROCESS_USERNAME` and `TARGETPROCESS_PASSWORD`
//!
//! Anything missing is read from `~/.config/targetprocess/config.json`.
//!
//! # Usage
//!
//! ```bash
//! TARGETPROCESS_URL=https://acme.tpondemand.com TARGETPROCESS_TOKEN=xxx ./targetprocess-mcp
//! ```

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, EnvFilter};

use targetprocess_mcp::{config, server, tp_client};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // stdout is reserved for MCP JSON-RPC messages
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("targetprocess_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(
        "Starting Targetprocess MCP server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = config::Config::load().context("Failed to load configuration")?;

    tracing::debug!(
        base_url = %config.base_url,
        auth = config.credentials.mode(),
        "Configuration loaded"
    );

    let client =
        tp_client::TpClient::new(&config).context("Failed to create Targetprocess client")?;

    tracing::info!("Testing connection to Targetprocess...");
    if let Err(e) = client.test_connection().await {
        tracing::error!(
            error = %e.sanitized_display(&client.secrets()),
            "Connection test failed"
        );
        tracing::warn!(
            "Server will start but may not be able to reach Targetprocess. \
             Check configuration and network connectivity."
        );
    }

    let server = server::TpServer::new(client);

    tracing::info!("Server initialized, starting stdio transport");

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })
        .context("Failed to start server")?;

    tracing::info!("Server running, waiting for requests");

    service
        .waiting()
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}
