//! Fiscal Core Library
//!
//! Error type and storage port traits for the fiscal registry.

// Re-export pure types from fiscal-types
pub use fiscal_types::*;

pub mod error;
pub mod ports;

pub use error::{FiscalError, ResourceKind, Result};
