use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use storage::{
    dto::scoring::{
        CreateSessionRequest, EntryView, MoveResponse, SaveEndRequest, SessionDetail,
        StatusChangeRequest, SubmitRequest, TransitionOutcome,
    },
    models::Session,
    services::{navigator::NavigatorState, scoring, status},
};
use utoipa::IntoParams;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentActor;
use crate::state::{AppState, today};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EntryQuery {
    /// 0-based, longest distance first
    pub range_idx: usize,
    pub end_no: i32,
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Session started in Preliminary status", body = Session),
        (status = 400, description = "Unknown member, round or competition"),
        (status = 403, description = "Competition has ended"),
        (status = 422, description = "Round has no ranges")
    ),
    tag = "sessions"
)]
pub async fn start_session(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let session = scoring::start_session(state.store(), &actor, &req, today()).await?;

    Ok((StatusCode::CREATED, Json(session)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = i32, Path, description = "Session id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session with its running total", body = SessionDetail),
        (status = 403, description = "Session belongs to another member"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
) -> Result<Json<SessionDetail>, WebError> {
    let detail = scoring::session_detail(state.store(), &actor, id, today()).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = i32, Path, description = "Session id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Draft deleted"),
        (status = 403, description = "Not a draft, locked, or not yours"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
) -> Result<StatusCode, WebError> {
    scoring::delete_session(state.store(), &actor, id, today()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}/entry",
    params(("id" = i32, Path, description = "Session id"), EntryQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Scoring screen for one end", body = EntryView),
        (status = 400, description = "Position outside the round")
    ),
    tag = "sessions"
)]
pub async fn get_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<EntryView>, WebError> {
    let position = NavigatorState {
        range_idx: query.range_idx,
        end_no: query.end_no,
    };
    let view = scoring::entry_view(state.store(), &actor, id, position, today()).await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}/resume",
    params(("id" = i32, Path, description = "Session id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Scoring screen at the first end still needing arrows", body = EntryView)
    ),
    tag = "sessions"
)]
pub async fn resume_session(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
) -> Result<Json<EntryView>, WebError> {
    let view = scoring::resume(state.store(), &actor, id, today()).await?;
    Ok(Json(view))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{id}/ends",
    params(("id" = i32, Path, description = "Session id")),
    request_body = SaveEndRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Arrows saved", body = EntryView),
        (status = 400, description = "Malformed arrow value"),
        (status = 403, description = "Session is locked or no longer editable")
    ),
    tag = "sessions"
)]
pub async fn save_end(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Json(req): Json<SaveEndRequest>,
) -> Result<Json<EntryView>, WebError> {
    req.validate()?;

    let today = today();
    scoring::save_end(state.store(), &actor, id, &req, today).await?;
    let view = scoring::entry_view(state.store(), &actor, id, req.state(), today).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/ends/next",
    params(("id" = i32, Path, description = "Session id")),
    request_body = SaveEndRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Buffered arrows saved and position advanced", body = MoveResponse)
    ),
    tag = "sessions"
)]
pub async fn next_end(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Json(req): Json<SaveEndRequest>,
) -> Result<Json<MoveResponse>, WebError> {
    req.validate()?;

    let moved = scoring::goto_next_end(state.store(), &actor, id, &req, today()).await?;
    Ok(Json(moved))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/ends/previous",
    params(("id" = i32, Path, description = "Session id")),
    request_body = SaveEndRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Buffered arrows saved and position moved back", body = MoveResponse)
    ),
    tag = "sessions"
)]
pub async fn previous_end(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Json(req): Json<SaveEndRequest>,
) -> Result<Json<MoveResponse>, WebError> {
    req.validate()?;

    let moved = scoring::goto_previous_end(state.store(), &actor, id, &req, today()).await?;
    Ok(Json(moved))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/submit",
    params(("id" = i32, Path, description = "Session id")),
    request_body = SubmitRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session is Final", body = TransitionOutcome),
        (status = 400, description = "Ends missing and allow_incomplete not set"),
        (status = 409, description = "Session is already Confirmed")
    ),
    tag = "sessions"
)]
pub async fn submit_session(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<TransitionOutcome>, WebError> {
    let outcome =
        status::submit_session(state.store(), &actor, id, req.allow_incomplete, today()).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{id}/status",
    params(("id" = i32, Path, description = "Session id")),
    request_body = StatusChangeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status changed or already at target", body = TransitionOutcome),
        (status = 403, description = "Locked, or role not allowed"),
        (status = 409, description = "Status cannot move backwards")
    ),
    tag = "sessions"
)]
pub async fn change_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<TransitionOutcome>, WebError> {
    let outcome = status::change_status(state.store(), &actor, id, req.status, today()).await?;
    Ok(Json(outcome))
}
