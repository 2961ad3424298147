//! Portcullis Server: HTTP API over the Portcullis repositories.
//!
//! ```ignore
//! use portcullis_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;

use portcullis_db::Database;
use surrealdb::engine::remote::ws::Client;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Builds the log filter: `env_directives` (usually `RUST_LOG`) with
/// `portcullis=info` on top.
///
/// Reset ids are only logged on
/// [`RESET_DELIVERY_TARGET`](portcullis_db::repository::RESET_DELIVERY_TARGET)
/// at `debug`, which stays off unless that target is named explicitly.
pub fn log_filter(env_directives: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::new(env_directives).add_directive("portcullis=info".parse()?))
}

/// The Portcullis server.
pub struct Server {
    config: ServerConfig,
    db: Database<Client>,
}

impl Server {
    /// Connects to SurrealDB and applies pending migrations.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let db = Database::connect(&config.db).await?;
        Ok(Self { config, db })
    }

    /// Serves requests until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let state = AppState::new(self.db.client().clone(), self.config.auth_config());
        let app = create_router(state);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(%addr, "Server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
