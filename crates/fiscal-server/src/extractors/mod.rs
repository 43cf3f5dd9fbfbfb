//! Request extractors
//!
//! `DbSession` checks out a storage session per request; the `Api*` wrappers
//! turn axum's rejections into `ApiError` bodies.

pub mod input;
pub mod session;

pub use input::{ApiJson, ApiPath, ApiQuery};
