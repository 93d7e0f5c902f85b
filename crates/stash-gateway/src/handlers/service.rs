//! Service-level handlers

use crate::responses::StatusResponse;
use crate::{ApiError, AppState};
use axum::{extract::State, Json};
use std::sync::Arc;

/// GET /api/status - Backend status
pub async fn backend_status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.gateway.status().await?;
    Ok(Json(status.into()))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("route".to_string())
}
