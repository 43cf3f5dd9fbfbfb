//! Storage layer
//!
//! Uses SQLite (embedded). Handlers never touch the pool directly: they check
//! out a [`DbSession`] for the lifetime of one request.

pub mod db;

pub use db::{Database, DbSession};
