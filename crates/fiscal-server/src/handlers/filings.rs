//! Filing handlers

use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::storage::DbSession;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use fiscal_core::ports::FilingStore;
use fiscal_core::{Filing, MessageResponse, NewFiling, Page, ResourceKind};
use tracing::info;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(filing): ApiJson<NewFiling>,
) -> Result<Json<Filing>, ApiError> {
    filing.validate()?;

    let mut db = state.db.acquire().await?;
    let created = db.insert_filing(&filing).await?;
    info!(
        "Filing {} created for organization {}",
        created.id, created.organization_id
    );

    Ok(Json(created))
}

pub async fn list(
    ApiQuery(page): ApiQuery<Page>,
    mut db: DbSession,
) -> Result<Json<Vec<Filing>>, ApiError> {
    let filings = db.list_filings(page).await?;
    Ok(Json(filings))
}

pub async fn get(
    ApiPath(id): ApiPath<i64>,
    mut db: DbSession,
) -> Result<Json<Filing>, ApiError> {
    db.find_filing(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(ResourceKind::Filing))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(filing): ApiJson<NewFiling>,
) -> Result<Json<Filing>, ApiError> {
    filing.validate()?;

    let mut db = state.db.acquire().await?;
    let updated = db
        .update_filing(id, &filing)
        .await?
        .ok_or_else(|| ApiError::not_found(ResourceKind::Filing))?;

    info!("Filing {} updated", id);
    Ok(Json(updated))
}

pub async fn delete(
    ApiPath(id): ApiPath<i64>,
    mut db: DbSession,
) -> Result<Json<MessageResponse>, ApiError> {
    if !db.delete_filing(id).await? {
        return Err(ApiError::not_found(ResourceKind::Filing));
    }

    info!("Filing {} deleted", id);
    Ok(Json(MessageResponse::new("Obrigação deletada com sucesso")))
}
