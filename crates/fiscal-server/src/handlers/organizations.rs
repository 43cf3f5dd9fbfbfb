//! Organization handlers

use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::storage::DbSession;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use fiscal_core::ports::OrganizationStore;
use fiscal_core::{MessageResponse, NewOrganization, Organization, Page, ResourceKind};
use tracing::info;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(org): ApiJson<NewOrganization>,
) -> Result<Json<Organization>, ApiError> {
    org.validate()?;

    let mut db = state.db.acquire().await?;
    let created = db.insert_organization(&org).await?;
    info!("Organization {} created", created.id);

    Ok(Json(created))
}

pub async fn list(
    ApiQuery(page): ApiQuery<Page>,
    mut db: DbSession,
) -> Result<Json<Vec<Organization>>, ApiError> {
    let organizations = db.list_organizations(page).await?;
    Ok(Json(organizations))
}

pub async fn get(
    ApiPath(id): ApiPath<i64>,
    mut db: DbSession,
) -> Result<Json<Organization>, ApiError> {
    db.find_organization(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(ResourceKind::Organization))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(org): ApiJson<NewOrganization>,
) -> Result<Json<Organization>, ApiError> {
    org.validate()?;

    let mut db = state.db.acquire().await?;
    match db.update_organization(id, &org).await? {
        Some(updated) => {
            info!("Organization {} updated", id);
            Ok(Json(updated))
        }
        None => Err(ApiError::not_found(ResourceKind::Organization)),
    }
}

pub async fn delete(
    ApiPath(id): ApiPath<i64>,
    mut db: DbSession,
) -> Result<Json<MessageResponse>, ApiError> {
    if !db.delete_organization(id).await? {
        return Err(ApiError::not_found(ResourceKind::Organization));
    }

    info!("Organization {} deleted with its filings", id);
    Ok(Json(MessageResponse::new("Empresa deletada com sucesso")))
}
