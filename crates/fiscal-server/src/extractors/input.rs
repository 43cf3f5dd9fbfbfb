//! Body, path and query extractors with `{"detail": ...}` rejections

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON body; malformed or mistyped payloads are rejected with 422
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; a non-numeric id is rejected with 422
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
