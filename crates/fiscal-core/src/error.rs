//! Error types for the fiscal registry

use fiscal_types::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FiscalError>;

/// Which resource a lookup was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Organization,
    Filing,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Organization => write!(f, "Empresa"),
            ResourceKind::Filing => write!(f, "Obrigação"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FiscalError {
    #[error("{0} não encontrada")]
    NotFound(ResourceKind),

    /// Unique constraint violated (duplicate tax id)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Foreign key points at a row that does not exist
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),
}

impl FiscalError {
    pub fn not_found(kind: ResourceKind) -> Self {
        FiscalError::NotFound(kind)
    }
}
