use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use storage::{
    dto::{
        report::{CompetitionSessionFilter, CompetitionSessionRow},
        scoring::{BulkStatusRequest, BulkStatusResponse},
    },
    models::SessionStatus,
    services::approvals,
};
use utoipa::IntoParams;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentActor;
use crate::state::{AppState, today};

/// Single-valued query form of the approval screen filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CompetitionSessionQuery {
    pub status: Option<SessionStatus>,
    pub round_id: Option<i32>,
    /// Case-insensitive partial match
    pub av_number: Option<String>,
}

impl From<CompetitionSessionQuery> for CompetitionSessionFilter {
    fn from(query: CompetitionSessionQuery) -> Self {
        Self {
            statuses: query.status.into_iter().collect(),
            round_ids: query.round_id.into_iter().collect(),
            av_number: query.av_number,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}/sessions",
    params(("id" = i32, Path, description = "Competition id"), CompetitionSessionQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sessions entered in the competition", body = Vec<CompetitionSessionRow>),
        (status = 403, description = "Recorder access required"),
        (status = 404, description = "Competition not found")
    ),
    tag = "approvals"
)]
pub async fn list_competition_sessions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Query(query): Query<CompetitionSessionQuery>,
) -> Result<Json<Vec<CompetitionSessionRow>>, WebError> {
    let filter = CompetitionSessionFilter::from(query);
    let rows =
        approvals::competition_sessions(state.store(), &actor, id, &filter, today()).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/sessions/bulk-status",
    params(("id" = i32, Path, description = "Competition id")),
    request_body = BulkStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Preview, or counts of the applied change", body = BulkStatusResponse),
        (status = 403, description = "Recorder access required")
    ),
    tag = "approvals"
)]
pub async fn bulk_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
    Json(req): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, WebError> {
    req.validate()?;

    let response = approvals::bulk_status(state.store(), &actor, id, &req, today()).await?;
    Ok(Json(response))
}
