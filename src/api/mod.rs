//! HTTP API surface.
//!
//! A thin axum layer over the pipeline: request parsing, status mapping and
//! history recording. All document semantics live in the pipeline; handlers
//! never inspect generated content.

pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::history::HistoryStore;
use crate::pipeline::DocumentPipeline;

pub use error::ApiError;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DocumentPipeline>,
    pub history: Arc<HistoryStore>,
    /// Session file for this process run; every generation appends here.
    pub session_file: PathBuf,
}

/// Build the API router with all routes under `/api/`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(handlers::generate))
        .route("/api/revise", post(handlers::revise))
        .route("/api/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the API until the process is stopped.
pub async fn serve(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    let router = api_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "API listening");
    axum::serve(listener, router).await
}
