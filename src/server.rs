//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/store` | Ingest the configured CSV file |
//! | `POST` | `/retrieve` | Answer `{"question": ...}` from stored chunks |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::ingest;
use crate::pipeline::Pipeline;
use crate::retrieve;

/// Build the router over a shared pipeline.
///
/// Request spans and response events are emitted at `INFO`, so requests
/// show up under the default `info` filter.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/store", get(handle_store))
        .route("/retrieve", post(handle_retrieve))
        .route("/health", get(handle_health))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(pipeline)
}

/// Bind `bind_addr` (host:port) and serve until the process receives Ctrl-C.
pub async fn run_server(bind_addr: &str, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Anything a pipeline stage returns is a server-side failure.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = format!("{:#}", err), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: format!("{:#}", err),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /store ============

#[derive(Serialize)]
struct StoreResponse {
    success: bool,
}

/// Runs ingestion to completion before responding. Each call appends a
/// fresh copy of the file's chunks.
async fn handle_store(
    State(pipeline): State<Arc<Pipeline>>,
) -> Result<Json<StoreResponse>, AppError> {
    ingest::run_store(&pipeline).await?;
    Ok(Json(StoreResponse { success: true }))
}

// ============ POST /retrieve ============

#[derive(Deserialize)]
struct RetrieveRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct RetrieveResponse {
    answer: String,
}

/// Validates the question before any embedding or model call is made.
async fn handle_retrieve(
    State(pipeline): State<Arc<Pipeline>>,
    payload: Result<Json<RetrieveRequest>, JsonRejection>,
) -> Result<Json<RetrieveResponse>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    let question = request
        .question
        .as_deref()
        .ok_or_else(|| bad_request("question is required"))?;
    let question = retrieve::normalize_question(question)
        .ok_or_else(|| bad_request("question must not be empty"))?;

    let answer = retrieve::answer_question(&pipeline, question).await?;
    Ok(Json(RetrieveResponse {
        answer: answer.answer,
    }))
}
