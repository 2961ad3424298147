//! Portcullis Server: application entry point.

use portcullis_server::{Server, ServerConfig, log_filter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&std::env::var("RUST_LOG").unwrap_or_default())?)
        .json()
        .init();

    tracing::info!("Starting Portcullis server...");

    let config = ServerConfig::from_env()?;
    let server = Server::new(config).await?;
    server.run().await?;

    tracing::info!("Portcullis server stopped.");
    Ok(())
}
