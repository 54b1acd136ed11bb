use axum::{Router, routing::get};

use super::handlers::{
    championship_ladder, club_records, competition_results, personal_bests, score_history,
    session_total,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/personal-bests", get(personal_bests))
        .route("/club-records", get(club_records))
        .route("/championships/:id/ladder", get(championship_ladder))
        .route("/competitions/:id/results", get(competition_results))
        .route("/history", get(score_history))
        .route("/sessions/:id/total", get(session_total))
}
