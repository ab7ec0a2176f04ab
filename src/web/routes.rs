//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};

use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/data", get(api_data))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Current board: `{ data, last_updated, total_sections }`.
///
/// Before the first successful cycle this is an empty board.
async fn api_data(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshots.read().await;
    Json(&*snapshot).into_response()
}
