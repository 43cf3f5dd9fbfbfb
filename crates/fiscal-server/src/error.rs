//! HTTP error responses
//!
//! Every failure leaves the server as `{"detail": "..."}` with a status code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fiscal_core::{FiscalError, ResourceKind, ValidationError};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(kind: ResourceKind) -> Self {
        FiscalError::not_found(kind).into()
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "detail": self.detail,
        }));
        (self.status, body).into_response()
    }
}

impl From<FiscalError> for ApiError {
    fn from(err: FiscalError) -> Self {
        match err {
            FiscalError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            FiscalError::Conflict(msg) => ApiError::new(StatusCode::CONFLICT, msg),
            FiscalError::InvalidReference(msg) => ApiError::unprocessable(msg),
            FiscalError::Validation(e) => ApiError::unprocessable(e.to_string()),
            FiscalError::Database(_) => {
                tracing::error!("Request failed: {}", err);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::unprocessable(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::unprocessable(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (FiscalError::not_found(ResourceKind::Filing), StatusCode::NOT_FOUND),
            (FiscalError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                FiscalError::InvalidReference("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                FiscalError::Validation(ValidationError::EmptyField("name")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                FiscalError::Database("disk I/O error".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_not_found_detail() {
        let err = ApiError::not_found(ResourceKind::Organization);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.detail, "Empresa não encontrada");
    }

    #[test]
    fn test_database_detail_is_not_leaked() {
        let err = ApiError::from(FiscalError::Database("no such table: filings".into()));
        assert_eq!(err.detail, "Erro interno");
    }
}
