use axum::{Json, extract::State};
use storage::{models::Member, services::members};

use crate::error::WebError;
use crate::middleware::auth::CurrentActor;
use crate::state::AppState;

/// Profile of the calling member. Assigns an AV number on first login.
#[utoipa::path(
    get,
    path = "/api/members/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Member profile", body = Member),
        (status = 401, description = "Missing member header")
    ),
    tag = "members"
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Member>, WebError> {
    let member = members::login_profile(state.store(), actor.member_id).await?;
    Ok(Json(member))
}
