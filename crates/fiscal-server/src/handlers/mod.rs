//! HTTP handlers

pub mod filings;
pub mod health;
pub mod organizations;

pub use health::health;
