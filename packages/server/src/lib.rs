//! AnswerDesk HTTP server
//!
//! REST API over the answer tree. Authentication is handled in front of
//! this server.
//!
//! # Security
//!
//! - CORS restricted to the configured origin (default http://localhost:3000)
//! - Binds to 127.0.0.1 only

use answerdesk_core::db::{DatabaseService, TursoStore};
use answerdesk_core::services::AnswerService;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod answer_endpoints;
pub mod config;
mod http_error;

pub use answer_endpoints::{SwapCategoriesRequest, SwapResponse, SwapSubcategoriesRequest};
pub use config::{ConfigError, ServerConfig};
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub answers: Arc<AnswerService<TursoStore>>,
}

impl AppState {
    /// Open the database described by `config` and build the services
    pub async fn open(config: &ServerConfig) -> anyhow::Result<Self> {
        let db = DatabaseService::with_busy_timeout(config.db_path.clone(), config.busy_timeout_ms)
            .await?;
        let store = Arc::new(TursoStore::new(Arc::new(db)));
        let answers = AnswerService::new(store, config.swap.clone())?;

        Ok(Self {
            answers: Arc::new(answers),
        })
    }
}

/// Create the application router
pub fn create_router(state: AppState, cors_origin: HeaderValue) -> Router {
    Router::new()
        .merge(answer_endpoints::routes(state))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(false)
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns error if the database cannot be opened or the server fails to
/// bind or start.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::open(&config).await?;
    let origin = config.cors_allow_origin.parse::<HeaderValue>()?;
    let app = create_router(state, origin);

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!("HTTP server starting on http://{}", addr);
    tracing::info!("CORS enabled for {}", config.cors_allow_origin);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
