use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use storage::{
    dto::{
        common::{Page, PageParams},
        report::{
            ChampionshipLadder, ClubRecord, CompetitionResults, PersonalBest, ScoreHistoryRow,
            SessionTotal,
        },
    },
    services::{leaderboard, scoring},
};
use utoipa::IntoParams;

use crate::error::WebError;
use crate::middleware::auth::CurrentActor;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PersonalBestQuery {
    /// Defaults to the calling member
    pub member_id: Option<i32>,
    /// Restrict to one round
    pub round_id: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClubRecordQuery {
    pub round_id: i32,
    /// Restrict to one category
    pub category_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/reports/personal-bests",
    params(PersonalBestQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Best Confirmed score per round", body = Vec<PersonalBest>)
    ),
    tag = "reports"
)]
pub async fn personal_bests(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<PersonalBestQuery>,
) -> Result<Json<Vec<PersonalBest>>, WebError> {
    let member_id = query.member_id.unwrap_or(actor.member_id);

    let bests = match query.round_id {
        Some(round_id) => leaderboard::personal_best(state.store(), member_id, round_id)
            .await?
            .into_iter()
            .collect(),
        None => leaderboard::personal_bests(state.store(), member_id).await?,
    };

    Ok(Json(bests))
}

#[utoipa::path(
    get,
    path = "/api/reports/club-records",
    params(ClubRecordQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Record holder per category", body = Vec<ClubRecord>),
        (status = 404, description = "Category not found")
    ),
    tag = "reports"
)]
pub async fn club_records(
    State(state): State<AppState>,
    Query(query): Query<ClubRecordQuery>,
) -> Result<Json<Vec<ClubRecord>>, WebError> {
    let records = match query.category_id {
        Some(category_id) => {
            leaderboard::club_record(state.store(), query.round_id, category_id)
                .await?
                .into_iter()
                .collect()
        }
        None => leaderboard::club_records(state.store(), query.round_id).await?,
    };

    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/reports/championships/{id}/ladder",
    params(("id" = i32, Path, description = "Championship id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Season standings", body = ChampionshipLadder),
        (status = 404, description = "Championship not found")
    ),
    tag = "reports"
)]
pub async fn championship_ladder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ChampionshipLadder>, WebError> {
    let ladder = leaderboard::championship_ladder(state.store(), id).await?;
    Ok(Json(ladder))
}

#[utoipa::path(
    get,
    path = "/api/reports/competitions/{id}/results",
    params(("id" = i32, Path, description = "Competition id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Confirmed results grouped by category", body = CompetitionResults),
        (status = 404, description = "Competition not found")
    ),
    tag = "reports"
)]
pub async fn competition_results(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CompetitionResults>, WebError> {
    let results = leaderboard::competition_results(state.store(), id).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/reports/history",
    params(PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sessions of the calling member, newest first", body = Page<ScoreHistoryRow>),
        (status = 400, description = "Invalid page parameters")
    ),
    tag = "reports"
)]
pub async fn score_history(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<ScoreHistoryRow>>, WebError> {
    page.validate()?;

    let history = leaderboard::score_history(state.store(), actor.member_id).await?;
    Ok(Json(page.slice(history)?))
}

#[utoipa::path(
    get,
    path = "/api/reports/sessions/{id}/total",
    params(("id" = i32, Path, description = "Session id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session total", body = SessionTotal)
    ),
    tag = "reports"
)]
pub async fn session_total(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i32>,
) -> Result<Json<SessionTotal>, WebError> {
    scoring::load_session(state.store(), &actor, id).await?;
    let total = scoring::session_total(state.store(), id).await?;
    Ok(Json(SessionTotal {
        session_id: id,
        total,
    }))
}
