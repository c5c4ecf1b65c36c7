//! HTTP front end for the scorer.
//!
//! Routes:
//! - `GET /score?url=...` risk report for one URL
//! - `GET /classes`       class labels of the loaded classifier
//! - `GET /health`        liveness and schema size

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::scoring::{ScoreError, ScoreReport, Scorer};

/// Shared application state
pub type AppState = Arc<Scorer>;

#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassesResponse {
    pub classes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub features: usize,
}

/// Error returned by handlers, rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub ScoreError);

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ScoreError::MissingInput => StatusCode::BAD_REQUEST,
            ScoreError::ModelEvaluation(msg) => {
                error!("Model evaluation failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

pub async fn score_handler(
    State(scorer): State<AppState>,
    Query(query): Query<ScoreQuery>,
) -> Result<Json<ScoreReport>, ApiError> {
    let url = query.url.unwrap_or_default();
    let report = scorer.score(&url)?;
    Ok(Json(report))
}

pub async fn classes_handler(State(scorer): State<AppState>) -> Json<ClassesResponse> {
    Json(ClassesResponse {
        classes: scorer.class_labels().to_vec(),
    })
}

pub async fn health_handler(State(scorer): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: scorer.schema().len(),
    })
}

/// Create the router with all routes and a permissive CORS policy
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/score", get(score_handler))
        .route("/classes", get(classes_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serves the scorer on `addr` until Ctrl-C.
pub async fn run_server(addr: SocketAddr, scorer: Scorer) -> std::io::Result<()> {
    let app = create_router(Arc::new(scorer));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
