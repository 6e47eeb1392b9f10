use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use kinesis_mcp::client::KinesisSdkClient;
use kinesis_mcp::config::{ServerConfig, LOG_ENV_VAR};
use kinesis_mcp::error::Result;
use kinesis_mcp::mcp_server::KinesisMcpServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("kinesis_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = kinesis_mcp::tools::verify_registry() {
        tracing::error!("Tool registry error: {}", e);
        std::process::exit(1);
    }

    let config = ServerConfig::from_env();
    tracing::info!(
        read_only = config.read_only,
        "Starting Kinesis MCP server..."
    );

    let api = Arc::new(KinesisSdkClient::new(config.clone()));
    let mut server = KinesisMcpServer::new(config, api);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
