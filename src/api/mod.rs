//! Read-only HTTP surface over the snapshot store.
//!
//! Handlers only ever take an `Arc<Snapshot>` or a short-lived store lock,
//! so requests never observe a cycle in progress.

mod error;
mod handlers;

use axum::routing::{get, post};
use axum::Router;

use crate::app::AppState;

pub use error::ApiError;
pub use handlers::{ChangesQuery, MatchFilter};

/// Paths advertised by the index route.
pub const ENDPOINTS: &[&str] = &[
    "/ping",
    "/api/status",
    "/api/matches",
    "/api/matches/{id}",
    "/api/matches/{id}/history",
    "/api/changes",
    "/api/refresh",
];

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/ping", get(handlers::ping))
        .route("/api/status", get(handlers::status))
        .route("/api/matches", get(handlers::list_matches))
        .route("/api/matches/:id", get(handlers::get_match))
        .route("/api/matches/:id/history", get(handlers::match_history))
        .route("/api/changes", get(handlers::recent_changes))
        .route("/api/refresh", post(handlers::refresh))
        .with_state(state)
}
