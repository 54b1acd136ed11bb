use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{bulk_status, list_competition_sessions};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id/sessions", get(list_competition_sessions))
        .route("/:id/sessions/bulk-status", post(bulk_status))
}
