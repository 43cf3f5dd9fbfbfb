//! Storage session extractor
//!
//! Handlers without a request body take a `DbSession` argument instead of
//! reaching into the pool. It goes after the path and query extractors, so a
//! malformed request is rejected before a connection is checked out. The
//! connection is returned when the handler's future completes, whatever the
//! outcome.

use crate::error::ApiError;
use crate::storage::DbSession;
use crate::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

#[async_trait]
impl FromRequestParts<AppState> for DbSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.db.acquire().await.map_err(ApiError::from)
    }
}
