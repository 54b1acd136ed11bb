use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::{
    Category, Championship, ChampionshipRound, Competition, CompetitionEntry, Member,
    NewSession, NewSessionAudit, RecordedEnd, Round, RoundRange, ScoredSession,
    ScoredSessionFilter, Session, SessionStatus,
};

/// Identity of whoever is making the request. Trusted as given; proving it is
/// the job of the surrounding guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    pub member_id: i32,
    pub is_recorder: bool,
}

impl Actor {
    pub fn archer(member_id: i32) -> Self {
        Self {
            member_id,
            is_recorder: false,
        }
    }

    pub fn recorder(member_id: i32) -> Self {
        Self {
            member_id,
            is_recorder: true,
        }
    }
}

/// Typed persistence boundary for the scoring core.
///
/// Every statement runs on its own; callers must not assume that a sequence of
/// calls is atomic.
#[async_trait]
pub trait ScoringStore: Send + Sync {
    async fn find_member(&self, member_id: i32) -> Result<Option<Member>>;
    async fn list_members(&self) -> Result<Vec<Member>>;
    async fn av_number_exists(&self, av_number: &str) -> Result<bool>;
    async fn set_av_number(&self, member_id: i32, av_number: &str) -> Result<()>;

    async fn find_round(&self, round_id: i32) -> Result<Option<Round>>;
    async fn list_rounds(&self) -> Result<Vec<Round>>;
    /// Ranges of a round, longest distance first.
    async fn list_round_ranges(&self, round_id: i32) -> Result<Vec<RoundRange>>;

    async fn create_session(&self, new_session: &NewSession) -> Result<Session>;
    async fn find_session(&self, session_id: i32) -> Result<Option<Session>>;
    async fn delete_session(&self, session_id: i32) -> Result<()>;
    async fn set_session_status(&self, session_id: i32, status: SessionStatus) -> Result<()>;
    async fn record_audit(&self, audit: &NewSessionAudit) -> Result<()>;

    /// Ends of a session ordered by range then end number.
    async fn list_ends(&self, session_id: i32) -> Result<Vec<RecordedEnd>>;
    /// Returns the id of the existing or newly created end.
    async fn upsert_end(&self, session_id: i32, round_range_id: i32, end_no: i32) -> Result<i32>;
    async fn upsert_arrow(&self, end_id: i32, arrow_no: i16, arrow_value: &str) -> Result<()>;

    async fn find_competition(&self, competition_id: i32) -> Result<Option<Competition>>;
    /// Competition the session is entered in, if any.
    async fn session_competition(&self, session_id: i32) -> Result<Option<Competition>>;
    async fn create_competition_entry(&self, competition_id: i32, session_id: i32) -> Result<()>;
    async fn update_competition_entry(
        &self,
        session_id: i32,
        category_id: Option<i32>,
        final_total: i32,
    ) -> Result<()>;
    async fn list_competition_entries(&self, competition_id: i32) -> Result<Vec<CompetitionEntry>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn find_championship(&self, championship_id: i32) -> Result<Option<Championship>>;
    async fn list_championship_rounds(&self, championship_id: i32)
    -> Result<Vec<ChampionshipRound>>;

    async fn list_scored_sessions(&self, filter: &ScoredSessionFilter)
    -> Result<Vec<ScoredSession>>;
}
