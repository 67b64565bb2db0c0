//! Answer tree endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `POST /api/answer/create` - Create a node
//! - `GET /api/answer` - List all nodes
//! - `GET /api/answer/:id` - Get a node by ID
//! - `DELETE /api/answer/:id` - Delete a node and its subtree
//! - `PUT /api/answer/swapCategoriesAndSubs` - Swap two categories
//! - `PUT /api/answer/swapSubs` - Swap two subcategories

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, HttpError};
use answerdesk_core::models::{NewNode, Node, NodeList};
use answerdesk_core::services::SwapOutcome;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Body of `PUT /api/answer/swapCategoriesAndSubs`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapCategoriesRequest {
    pub id_a: i64,
    pub id_b: i64,
}

/// Body of `PUT /api/answer/swapSubs`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSubcategoriesRequest {
    pub sub_id_a: i64,
    pub sub_id_b: i64,
}

/// Confirmation returned by both swap endpoints
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub message: String,
    pub id_a: i64,
    pub id_b: i64,
    pub children_rewritten: u64,
}

impl From<SwapOutcome> for SwapResponse {
    fn from(outcome: SwapOutcome) -> Self {
        Self {
            message: outcome.message,
            id_a: outcome.id_a,
            id_b: outcome.id_b,
            children_rewritten: outcome.children_rewritten,
        }
    }
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a new node
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/answer/create \
///   -H "Content-Type: application/json" \
///   -d '{"quest": "Admissions", "isnode": true}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    Json(node): Json<NewNode>,
) -> Result<(StatusCode, Json<Node>), HttpError> {
    let node = state.answers.create(node).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn list_nodes(State(state): State<AppState>) -> Result<Json<NodeList>, HttpError> {
    Ok(Json(state.answers.list().await?))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(state.answers.get(id).await?))
}

/// Delete a node; its children are removed with it
async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(state.answers.delete(id).await?))
}

/// Swap two categories and their direct children
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/answer/swapCategoriesAndSubs \
///   -H "Content-Type: application/json" \
///   -d '{"idA": 1, "idB": 2}'
/// ```
async fn swap_categories(
    State(state): State<AppState>,
    Json(request): Json<SwapCategoriesRequest>,
) -> Result<Json<SwapResponse>, HttpError> {
    let outcome = state
        .answers
        .swap_categories(request.id_a, request.id_b)
        .await?;
    Ok(Json(outcome.into()))
}

async fn swap_subcategories(
    State(state): State<AppState>,
    Json(request): Json<SwapSubcategoriesRequest>,
) -> Result<Json<SwapResponse>, HttpError> {
    let outcome = state
        .answers
        .swap_subcategories(request.sub_id_a, request.sub_id_b)
        .await?;
    Ok(Json(outcome.into()))
}

/// Create router with answer tree endpoints
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/answer", get(list_nodes))
        .route("/api/answer/create", post(create_node))
        .route("/api/answer/swapCategoriesAndSubs", put(swap_categories))
        .route("/api/answer/swapSubs", put(swap_subcategories))
        .route("/api/answer/:id", get(get_node).delete(delete_node))
        .with_state(state)
}
