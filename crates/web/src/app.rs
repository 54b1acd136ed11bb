use axum::{Router, middleware};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::sessions::handlers::start_session,
        features::sessions::handlers::get_session,
        features::sessions::handlers::delete_session,
        features::sessions::handlers::get_entry,
        features::sessions::handlers::resume_session,
        features::sessions::handlers::save_end,
        features::sessions::handlers::next_end,
        features::sessions::handlers::previous_end,
        features::sessions::handlers::submit_session,
        features::sessions::handlers::change_status,
        features::approvals::handlers::list_competition_sessions,
        features::approvals::handlers::bulk_status,
        features::reports::handlers::personal_bests,
        features::reports::handlers::club_records,
        features::reports::handlers::championship_ladder,
        features::reports::handlers::competition_results,
        features::reports::handlers::score_history,
        features::reports::handlers::session_total,
        features::members::handlers::me,
        features::rounds::handlers::list_rounds,
    ),
    components(
        schemas(
            storage::dto::scoring::CreateSessionRequest,
            storage::dto::scoring::SaveEndRequest,
            storage::dto::scoring::SubmitRequest,
            storage::dto::scoring::StatusChangeRequest,
            storage::dto::scoring::BulkStatusRequest,
            storage::dto::scoring::BulkStatusResponse,
            storage::dto::scoring::AllowedActions,
            storage::dto::scoring::EntryView,
            storage::dto::scoring::MoveResponse,
            storage::dto::scoring::SessionDetail,
            storage::dto::scoring::TransitionOutcome,
            storage::dto::scoring::BulkFailure,
            storage::dto::scoring::BulkTransitionReport,
            storage::dto::report::PersonalBest,
            storage::dto::report::ClubRecord,
            storage::dto::report::CountedRound,
            storage::dto::report::LadderRow,
            storage::dto::report::ChampionshipLadder,
            storage::dto::report::CompetitionResultRow,
            storage::dto::report::CategoryResults,
            storage::dto::report::CompetitionResults,
            storage::dto::report::HistoryBucket,
            storage::dto::report::ScoreHistoryRow,
            storage::dto::report::RoundDefinition,
            storage::dto::report::CompetitionSessionRow,
            storage::dto::report::CompetitionSessionFilter,
            storage::dto::report::SessionTotal,
            storage::services::navigator::NavigatorState,
            storage::services::navigator::NavigatorStep,
            storage::models::Session,
            storage::models::SessionStatus,
            storage::models::Member,
            storage::models::RoundRange,
        )
    ),
    tags(
        (name = "sessions", description = "Score entry and session lifecycle"),
        (name = "approvals", description = "Recorder approval of competition sessions"),
        (name = "reports", description = "Personal bests, club records and standings"),
        (name = "members", description = "Member profile"),
        (name = "rounds", description = "Round definitions"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/sessions", features::sessions::routes::routes())
        .nest("/competitions", features::approvals::routes::routes())
        .nest("/reports", features::reports::routes::routes())
        .nest("/members", features::members::routes::routes())
        .nest("/rounds", features::rounds::routes::routes())
        .route_layer(middleware::from_fn_with_state(
            state.api_keys.clone(),
            require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use chrono::{Days, NaiveDate};
    use serde_json::{Value, json};
    use storage::{ScoringStore, memory::MemoryStore, models::SessionStatus};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::auth::{ApiKeys, MEMBER_HEADER};
    use crate::state::today;

    const KEY: &str = "test-key";

    struct Fixture {
        store: Arc<MemoryStore>,
        archer: i32,
        recorder: i32,
        round: i32,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let archer = store.add_member("Ada Arrow", "F", "R", 1990, false);
            let recorder = store.add_member("Rex Recorder", "M", "C", 1970, true);
            let round = store.add_round("Short Metric", &[(50, 122, 2), (30, 80, 1)]);
            Self {
                store,
                archer,
                recorder,
                round,
            }
        }

        fn router(&self) -> Router {
            let store: Arc<dyn ScoringStore> = self.store.clone();
            build_router(AppState::new(store, ApiKeys::from_comma_separated(KEY)))
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            member_id: i32,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", KEY))
                .header(MEMBER_HEADER, member_id.to_string());

            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected() {
        let fixture = Fixture::new();
        let request = Request::builder()
            .uri("/api/rounds")
            .header(MEMBER_HEADER, fixture.archer.to_string())
            .body(Body::empty())
            .unwrap();

        let response = fixture.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_member_is_forbidden() {
        let fixture = Fixture::new();
        let (status, _) = fixture.call(Method::GET, "/api/members/me", 999, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_score_entry_flow() {
        let fixture = Fixture::new();

        let (status, session) = fixture
            .call(
                Method::POST,
                "/api/sessions",
                fixture.archer,
                Some(json!({ "round_id": fixture.round })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["status"], "Preliminary");
        let id = session["session_id"].as_i64().unwrap();

        let (status, moved) = fixture
            .call(
                Method::POST,
                &format!("/api/sessions/{}/ends/next", id),
                fixture.archer,
                Some(json!({
                    "range_idx": 0,
                    "end_no": 1,
                    "arrows": ["X", "10", "9", "9", "8", "M"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["step"]["kind"], "moved");
        assert_eq!(moved["entry"]["end_no"], 2);
        assert_eq!(moved["entry"]["session_total"], 46);

        let (status, total) = fixture
            .call(
                Method::GET,
                &format!("/api/reports/sessions/{}/total", id),
                fixture.archer,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(total["total"], 46);

        let (status, outcome) = fixture
            .call(
                Method::POST,
                &format!("/api/sessions/{}/submit", id),
                fixture.archer,
                Some(json!({ "allow_incomplete": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "updated");
        assert_eq!(outcome["to"], "Final");
    }

    #[tokio::test]
    async fn test_bad_arrow_token_is_a_bad_request() {
        let fixture = Fixture::new();
        let id = fixture
            .store
            .insert_session(fixture.archer, fixture.round, today(), SessionStatus::Preliminary);

        let (status, body) = fixture
            .call(
                Method::PUT,
                &format!("/api/sessions/{}/ends", id),
                fixture.archer,
                Some(json!({ "range_idx": 0, "end_no": 1, "arrows": ["11"] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_revert_is_a_conflict() {
        let fixture = Fixture::new();
        let id = fixture
            .store
            .insert_session(fixture.archer, fixture.round, today(), SessionStatus::Confirmed);

        let (status, _) = fixture
            .call(
                Method::PUT,
                &format!("/api/sessions/{}/status", id),
                fixture.recorder,
                Some(json!({ "status": "Final" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(fixture.store.status_of(id), Some(SessionStatus::Confirmed));
    }

    #[tokio::test]
    async fn test_closed_competition_blocks_changes() {
        let fixture = Fixture::new();
        let ended = today() - Days::new(2);
        let comp = fixture.store.add_competition(
            "Autumn Open",
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            ended,
        );
        let id = fixture
            .store
            .insert_session(fixture.archer, fixture.round, ended, SessionStatus::Final);
        fixture.store.enter_competition(comp, id);

        let (status, _) = fixture
            .call(
                Method::PUT,
                &format!("/api/sessions/{}/status", id),
                fixture.recorder,
                Some(json!({ "status": "Confirmed" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, detail) = fixture
            .call(Method::GET, &format!("/api/sessions/{}", id), fixture.archer, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["locked"], true);
    }

    #[tokio::test]
    async fn test_archers_cannot_bulk_approve() {
        let fixture = Fixture::new();
        let comp = fixture
            .store
            .add_competition("Club Shoot", today(), today() + Days::new(5));

        let (status, _) = fixture
            .call(
                Method::POST,
                &format!("/api/competitions/{}/sessions/bulk-status", comp),
                fixture.archer,
                Some(json!({ "target": "Confirmed" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
