//! Fiscal Registry Server
//!
//! CRUD over organizations ("empresas") and their compliance filings
//! ("obrigações acessórias"), backed by embedded SQLite.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod settings;
pub mod storage;

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use handlers::{filings, organizations};
use storage::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(resource_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Collections answer with and without the trailing slash
fn organization_collection() -> MethodRouter<AppState> {
    get(organizations::list).post(organizations::create)
}

fn filing_collection() -> MethodRouter<AppState> {
    get(filings::list).post(filings::create)
}

fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/organizations", organization_collection())
        .route("/organizations/", organization_collection())
        .route(
            "/organizations/:id",
            get(organizations::get)
                .put(organizations::update)
                .delete(organizations::delete),
        )
        .route("/filings", filing_collection())
        .route("/filings/", filing_collection())
        .route(
            "/filings/:id",
            get(filings::get).put(filings::update).delete(filings::delete),
        )
}
