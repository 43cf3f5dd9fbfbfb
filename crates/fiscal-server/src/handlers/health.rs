//! Health check

use crate::error::ApiError;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// Round-trips through a storage session; 503 when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let unavailable = |e: fiscal_core::FiscalError| {
        tracing::warn!("Health check failed: {}", e);
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Banco de dados indisponível")
    };

    let mut session = state.db.acquire().await.map_err(unavailable)?;
    session.ping().await.map_err(unavailable)?;

    Ok(Json(json!({ "status": "ok" })))
}
