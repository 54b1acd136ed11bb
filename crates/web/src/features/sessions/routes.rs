use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers::{
    change_status, delete_session, get_entry, get_session, next_end, previous_end,
    resume_session, save_end, start_session, submit_session,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/entry", get(get_entry))
        .route("/:id/resume", get(resume_session))
        .route("/:id/ends", put(save_end))
        .route("/:id/ends/next", post(next_end))
        .route("/:id/ends/previous", post(previous_end))
        .route("/:id/submit", post(submit_session))
        .route("/:id/status", put(change_status))
}
