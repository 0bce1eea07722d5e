//! HTTP endpoint handlers.
//!
//! The pipeline does blocking I/O (providers use a blocking HTTP client),
//! so every pipeline call runs on the blocking thread pool via
//! `spawn_blocking`, never on the async runtime itself.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::config::APP_VERSION;
use crate::models::{ClinicalPayload, GenerationResult, RevisionResult};

/// POST /api/generate
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<ClinicalPayload>,
) -> Result<Json<GenerationResult>, ApiError> {
    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.generate(&payload))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    // History is best-effort audit material and never fails the request.
    if let Ok(record) = serde_json::to_value(&result) {
        if let Err(e) = state.history.append_record(&state.session_file, &record) {
            tracing::warn!(error = %e, "Failed to append history record");
        }
    }

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ReviseRequest {
    pub texto: String,
}

/// POST /api/revise
pub async fn revise(
    State(state): State<AppState>,
    Json(request): Json<ReviseRequest>,
) -> Result<Json<RevisionResult>, ApiError> {
    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.revise(&request.texto))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub available: bool,
}

/// GET /api/health
///
/// Availability probes hit the provider endpoints, hence the blocking pool
/// here as well.
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pipeline = state.pipeline.clone();
    let status = tokio::task::spawn_blocking(move || pipeline.provider_status())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let providers: Vec<ProviderStatus> = status
        .into_iter()
        .map(|(name, available)| ProviderStatus { name, available })
        .collect();
    Ok(Json(json!({
        "status": "ok",
        "version": APP_VERSION,
        "providers": providers,
    })))
}
