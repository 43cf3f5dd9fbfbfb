//! Fiscal Types - Pure wire and domain types
//!
//! Shared between the storage layer and the HTTP handlers. No async runtime
//! or database dependencies live here.

pub mod filing;
pub mod organization;

pub use filing::*;
pub use organization::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of rows returned by list endpoints
pub const DEFAULT_LIMIT: u32 = 100;

/// Payload rejected before it reaches storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
}

/// Offset/limit window for list operations (`?skip=&limit=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Confirmation body returned by delete endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub(crate) fn require_non_empty(
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
