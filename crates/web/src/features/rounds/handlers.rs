use axum::{Json, extract::State};
use storage::{dto::report::RoundDefinition, services::leaderboard};

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/rounds",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every round with its ranges and totals", body = Vec<RoundDefinition>)
    ),
    tag = "rounds"
)]
pub async fn list_rounds(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundDefinition>>, WebError> {
    let rounds = leaderboard::round_definitions(state.store()).await?;
    Ok(Json(rounds))
}
