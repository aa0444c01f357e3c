//! Read-only HTTP API over the persisted graph.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use debtgraph_rs::search::{CustomerDetail, GraphExport, Kpis};
use debtgraph_rs::{DebtGraphError, GraphDriver, GraphSearch};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::store::Store;

pub struct AppState {
    pub search: GraphSearch<Store>,
}

impl AppState {
    pub fn new(search: GraphSearch<Store>) -> Arc<Self> {
        Arc::new(Self { search })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/kpis", get(kpis_handler))
        .route("/cliente/{id}", get(customer_handler))
        .route("/grafo", get(graph_handler))
        .route("/test", get(diagnostic_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

/// Error body returned by every handler.
pub enum ApiError {
    NotFound(String),
    Graph(DebtGraphError),
}

impl From<DebtGraphError> for ApiError {
    fn from(err: DebtGraphError) -> Self {
        ApiError::Graph(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Graph(DebtGraphError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Graph(err) => {
                error!(error = %err, "graph query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn kpis_handler(State(state): State<Arc<AppState>>) -> Result<Json<Kpis>, ApiError> {
    Ok(Json(state.search.kpis().await?))
}

async fn customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError> {
    state
        .search
        .customer_detail(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Cliente {id} no encontrado")))
}

#[derive(Debug, Deserialize)]
struct GraphParams {
    filter_tipo: Option<String>,
}

async fn graph_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Result<Json<GraphExport>, ApiError> {
    Ok(Json(
        state
            .search
            .graph_export(params.filter_tipo.as_deref())
            .await?,
    ))
}

/// Plain-text facts of the first customer-owns-debt edges.
async fn diagnostic_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    Ok(state.search.diagnostic().await?)
}

/// Liveness probe.
async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: 200 when the graph store answers a ping.
async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.search.driver().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
