//! AnswerDesk HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 5000, default DB path)
//! cargo run --bin answerdesk-server
//!
//! # Custom port and database
//! ANSWERDESK_PORT=5001 ANSWERDESK_DB_PATH=/tmp/answers.db cargo run --bin answerdesk-server
//! ```
//!
//! # Environment Variables
//!
//! See [`answerdesk_server::config`]; `RUST_LOG` sets the log level
//! (e.g. "info", "debug", "answerdesk_core=debug").

use answerdesk_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("AnswerDesk HTTP Server");

    let config = ServerConfig::from_env()?;

    tracing::info!("Port: {}", config.port);
    tracing::info!("Database: {}", config.db_path.display());
    tracing::info!("Swap sentinel: {}", config.swap.sentinel);

    answerdesk_server::start_server(config).await
}
