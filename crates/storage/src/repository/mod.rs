pub mod competition;
pub mod member;
pub mod report;
pub mod round;
pub mod session;

use async_trait::async_trait;

use crate::database::Database;
use crate::error::Result;
use crate::models::{
    Category, Championship, ChampionshipRound, Competition, CompetitionEntry, Member, NewSession,
    NewSessionAudit, RecordedEnd, Round, RoundRange, ScoredSession, ScoredSessionFilter, Session,
    SessionStatus,
};
use crate::store::ScoringStore;

use competition::CompetitionRepository;
use member::MemberRepository;
use report::ReportRepository;
use round::RoundRepository;
use session::SessionRepository;

#[async_trait]
impl ScoringStore for Database {
    async fn find_member(&self, member_id: i32) -> Result<Option<Member>> {
        MemberRepository::new(self.pool()).find_by_id(member_id).await
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        MemberRepository::new(self.pool()).list().await
    }

    async fn av_number_exists(&self, av_number: &str) -> Result<bool> {
        MemberRepository::new(self.pool())
            .av_number_exists(av_number)
            .await
    }

    async fn set_av_number(&self, member_id: i32, av_number: &str) -> Result<()> {
        MemberRepository::new(self.pool())
            .set_av_number(member_id, av_number)
            .await
    }

    async fn find_round(&self, round_id: i32) -> Result<Option<Round>> {
        RoundRepository::new(self.pool()).find_by_id(round_id).await
    }

    async fn list_rounds(&self) -> Result<Vec<Round>> {
        RoundRepository::new(self.pool()).list().await
    }

    async fn list_round_ranges(&self, round_id: i32) -> Result<Vec<RoundRange>> {
        RoundRepository::new(self.pool()).list_ranges(round_id).await
    }

    async fn create_session(&self, new_session: &NewSession) -> Result<Session> {
        SessionRepository::new(self.pool()).create(new_session).await
    }

    async fn find_session(&self, session_id: i32) -> Result<Option<Session>> {
        SessionRepository::new(self.pool()).find_by_id(session_id).await
    }

    async fn delete_session(&self, session_id: i32) -> Result<()> {
        SessionRepository::new(self.pool()).delete(session_id).await
    }

    async fn set_session_status(&self, session_id: i32, status: SessionStatus) -> Result<()> {
        SessionRepository::new(self.pool())
            .set_status(session_id, status)
            .await
    }

    async fn record_audit(&self, audit: &NewSessionAudit) -> Result<()> {
        SessionRepository::new(self.pool()).record_audit(audit).await
    }

    async fn list_ends(&self, session_id: i32) -> Result<Vec<RecordedEnd>> {
        SessionRepository::new(self.pool()).list_ends(session_id).await
    }

    async fn upsert_end(&self, session_id: i32, round_range_id: i32, end_no: i32) -> Result<i32> {
        SessionRepository::new(self.pool())
            .upsert_end(session_id, round_range_id, end_no)
            .await
    }

    async fn upsert_arrow(&self, end_id: i32, arrow_no: i16, arrow_value: &str) -> Result<()> {
        SessionRepository::new(self.pool())
            .upsert_arrow(end_id, arrow_no, arrow_value)
            .await
    }

    async fn find_competition(&self, competition_id: i32) -> Result<Option<Competition>> {
        CompetitionRepository::new(self.pool())
            .find_by_id(competition_id)
            .await
    }

    async fn session_competition(&self, session_id: i32) -> Result<Option<Competition>> {
        CompetitionRepository::new(self.pool())
            .find_for_session(session_id)
            .await
    }

    async fn create_competition_entry(&self, competition_id: i32, session_id: i32) -> Result<()> {
        CompetitionRepository::new(self.pool())
            .create_entry(competition_id, session_id)
            .await
    }

    async fn update_competition_entry(
        &self,
        session_id: i32,
        category_id: Option<i32>,
        final_total: i32,
    ) -> Result<()> {
        CompetitionRepository::new(self.pool())
            .update_entry(session_id, category_id, final_total)
            .await
    }

    async fn list_competition_entries(&self, competition_id: i32) -> Result<Vec<CompetitionEntry>> {
        CompetitionRepository::new(self.pool())
            .list_entries(competition_id)
            .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        CompetitionRepository::new(self.pool()).list_categories().await
    }

    async fn find_championship(&self, championship_id: i32) -> Result<Option<Championship>> {
        CompetitionRepository::new(self.pool())
            .find_championship(championship_id)
            .await
    }

    async fn list_championship_rounds(
        &self,
        championship_id: i32,
    ) -> Result<Vec<ChampionshipRound>> {
        CompetitionRepository::new(self.pool())
            .list_championship_rounds(championship_id)
            .await
    }

    async fn list_scored_sessions(
        &self,
        filter: &ScoredSessionFilter,
    ) -> Result<Vec<ScoredSession>> {
        ReportRepository::new(self.pool()).scored_sessions(filter).await
    }
}
