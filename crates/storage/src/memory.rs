//! In-process [`ScoringStore`] used by tests across the workspace.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, StorageError};
use crate::models::{
    Arrow, Category, Championship, ChampionshipRound, Competition, CompetitionEntry, Member,
    NewSession, NewSessionAudit, RecordedEnd, Round, RoundRange, ScoredSession,
    ScoredSessionFilter, Session, SessionAudit, SessionStatus,
};
use crate::store::ScoringStore;

#[derive(Debug, Clone)]
struct StoredEnd {
    end_id: i32,
    session_id: i32,
    round_range_id: i32,
    end_no: i32,
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    members: Vec<Member>,
    rounds: Vec<Round>,
    ranges: Vec<RoundRange>,
    sessions: Vec<Session>,
    ends: Vec<StoredEnd>,
    arrows: Vec<Arrow>,
    competitions: Vec<Competition>,
    entries: Vec<CompetitionEntry>,
    categories: Vec<Category>,
    championships: Vec<Championship>,
    championship_rounds: Vec<ChampionshipRound>,
    audits: Vec<SessionAudit>,
    audit_missing: bool,
    failing_status_writes: HashSet<i32>,
    failing_entry_writes: HashSet<i32>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn recorded_ends(&self, session_id: i32) -> Vec<RecordedEnd> {
        let mut ends: Vec<RecordedEnd> = self
            .ends
            .iter()
            .filter(|e| e.session_id == session_id)
            .map(|e| {
                let mut arrows: Vec<Arrow> = self
                    .arrows
                    .iter()
                    .filter(|a| a.end_id == e.end_id)
                    .cloned()
                    .collect();
                arrows.sort_by_key(|a| a.arrow_no);
                RecordedEnd {
                    end_id: e.end_id,
                    session_id: e.session_id,
                    round_range_id: e.round_range_id,
                    end_no: e.end_no,
                    arrows,
                }
            })
            .collect();
        ends.sort_by_key(|e| (e.round_range_id, e.end_no));
        ends
    }

    fn competition_of(&self, session_id: i32) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.session_id == session_id)
            .map(|e| e.competition_id)
    }
}

/// Thread-safe in-memory store with the same observable behaviour as the
/// Postgres repositories, plus hooks to inject failures.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_member(
        &self,
        full_name: &str,
        gender_code: &str,
        division_code: &str,
        birth_year: i32,
        is_recorder: bool,
    ) -> i32 {
        let mut state = self.lock();
        let member_id = state.next_id();
        state.members.push(Member {
            member_id,
            full_name: full_name.to_string(),
            av_number: None,
            gender_code: gender_code.to_string(),
            division_code: division_code.to_string(),
            birth_year,
            is_recorder,
            created_at: now(),
        });
        member_id
    }

    /// Adds a round from `(distance_m, face_size, ends_per_range)` triples.
    pub fn add_round(&self, round_name: &str, ranges: &[(i32, i32, i32)]) -> i32 {
        let mut state = self.lock();
        let round_id = state.next_id();
        state.rounds.push(Round {
            round_id,
            round_name: round_name.to_string(),
        });
        for &(distance_m, face_size, ends_per_range) in ranges {
            let round_range_id = state.next_id();
            state.ranges.push(RoundRange {
                round_range_id,
                round_id,
                distance_m,
                face_size,
                ends_per_range,
            });
        }
        round_id
    }

    pub fn add_competition(&self, name: &str, start_date: NaiveDate, end_date: NaiveDate) -> i32 {
        let mut state = self.lock();
        let competition_id = state.next_id();
        state.competitions.push(Competition {
            competition_id,
            name: name.to_string(),
            start_date,
            end_date,
        });
        competition_id
    }

    pub fn add_category(
        &self,
        age_class_code: &str,
        gender_code: &str,
        division_code: &str,
        birth_years: (i32, i32),
    ) -> i32 {
        let mut state = self.lock();
        let category_id = state.next_id();
        state.categories.push(Category {
            category_id,
            name: format!("{} {} {}", age_class_code, gender_code, division_code),
            age_class_code: age_class_code.to_string(),
            gender_code: gender_code.to_string(),
            division_code: division_code.to_string(),
            min_birth_year: birth_years.0,
            max_birth_year: birth_years.1,
        });
        category_id
    }

    /// Adds a championship from `(round_id, best_of)` pairs.
    pub fn add_championship(
        &self,
        name: &str,
        season_start: NaiveDate,
        season_end: NaiveDate,
        rounds: &[(i32, i32)],
    ) -> i32 {
        let mut state = self.lock();
        let championship_id = state.next_id();
        state.championships.push(Championship {
            championship_id,
            name: name.to_string(),
            season_start,
            season_end,
        });
        for &(round_id, best_of) in rounds {
            state.championship_rounds.push(ChampionshipRound {
                championship_id,
                round_id,
                best_of,
            });
        }
        championship_id
    }

    pub fn insert_session(
        &self,
        member_id: i32,
        round_id: i32,
        shoot_date: NaiveDate,
        status: SessionStatus,
    ) -> i32 {
        let mut state = self.lock();
        let division_code = state
            .members
            .iter()
            .find(|m| m.member_id == member_id)
            .map(|m| m.division_code.clone())
            .unwrap_or_else(|| "R".to_string());
        let session_id = state.next_id();
        state.sessions.push(Session {
            session_id,
            member_id,
            round_id,
            division_code,
            shoot_date,
            status,
            created_at: now(),
        });
        session_id
    }

    pub fn enter_competition(&self, competition_id: i32, session_id: i32) {
        let mut state = self.lock();
        let entry_id = state.next_id();
        state.entries.push(CompetitionEntry {
            entry_id,
            competition_id,
            session_id,
            category_id: None,
            final_total: None,
        });
    }

    /// Writes a whole end directly, bypassing the scoring rules.
    pub fn record_end(&self, session_id: i32, round_range_id: i32, end_no: i32, values: &[&str]) {
        let mut state = self.lock();
        let end_id = state.next_id();
        state.ends.push(StoredEnd {
            end_id,
            session_id,
            round_range_id,
            end_no,
        });
        for (idx, value) in values.iter().enumerate() {
            state.arrows.push(Arrow {
                end_id,
                arrow_no: idx as i16 + 1,
                arrow_value: value.to_string(),
            });
        }
    }

    /// Ranges of a round, longest distance first.
    pub fn ranges_of(&self, round_id: i32) -> Vec<RoundRange> {
        let mut ranges: Vec<RoundRange> = self
            .lock()
            .ranges
            .iter()
            .filter(|r| r.round_id == round_id)
            .cloned()
            .collect();
        ranges.sort_by(|a, b| b.distance_m.cmp(&a.distance_m));
        ranges
    }

    pub fn status_of(&self, session_id: i32) -> Option<SessionStatus> {
        self.lock()
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .map(|s| s.status)
    }

    pub fn audits(&self) -> Vec<SessionAudit> {
        self.lock().audits.clone()
    }

    pub fn entry_for(&self, session_id: i32) -> Option<CompetitionEntry> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.session_id == session_id)
            .cloned()
    }

    /// Simulates a database without the `session_audit` table.
    pub fn drop_audit_table(&self) {
        self.lock().audit_missing = true;
    }

    pub fn fail_status_writes_for(&self, session_id: i32) {
        self.lock().failing_status_writes.insert(session_id);
    }

    pub fn fail_entry_writes_for(&self, session_id: i32) {
        self.lock().failing_entry_writes.insert(session_id);
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[async_trait]
impl ScoringStore for MemoryStore {
    async fn find_member(&self, member_id: i32) -> Result<Option<Member>> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.member_id == member_id)
            .cloned())
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        let mut members = self.lock().members.clone();
        members.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(members)
    }

    async fn av_number_exists(&self, av_number: &str) -> Result<bool> {
        Ok(self
            .lock()
            .members
            .iter()
            .any(|m| m.av_number.as_deref() == Some(av_number)))
    }

    async fn set_av_number(&self, member_id: i32, av_number: &str) -> Result<()> {
        let mut state = self.lock();
        if state
            .members
            .iter()
            .any(|m| m.member_id != member_id && m.av_number.as_deref() == Some(av_number))
        {
            return Err(StorageError::ConstraintViolation(
                "AV number already exists".to_string(),
            ));
        }
        let member = state
            .members
            .iter_mut()
            .find(|m| m.member_id == member_id)
            .ok_or(StorageError::NotFound)?;
        member.av_number = Some(av_number.to_string());
        Ok(())
    }

    async fn find_round(&self, round_id: i32) -> Result<Option<Round>> {
        Ok(self
            .lock()
            .rounds
            .iter()
            .find(|r| r.round_id == round_id)
            .cloned())
    }

    async fn list_rounds(&self) -> Result<Vec<Round>> {
        let mut rounds = self.lock().rounds.clone();
        rounds.sort_by(|a, b| a.round_name.cmp(&b.round_name));
        Ok(rounds)
    }

    async fn list_round_ranges(&self, round_id: i32) -> Result<Vec<RoundRange>> {
        Ok(self.ranges_of(round_id))
    }

    async fn create_session(&self, new_session: &NewSession) -> Result<Session> {
        let mut state = self.lock();
        let session = Session {
            session_id: state.next_id(),
            member_id: new_session.member_id,
            round_id: new_session.round_id,
            division_code: new_session.division_code.clone(),
            shoot_date: new_session.shoot_date,
            status: SessionStatus::Preliminary,
            created_at: now(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session(&self, session_id: i32) -> Result<Option<Session>> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned())
    }

    async fn delete_session(&self, session_id: i32) -> Result<()> {
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.session_id != session_id);
        if state.sessions.len() == before {
            return Err(StorageError::NotFound);
        }

        let end_ids: HashSet<i32> = state
            .ends
            .iter()
            .filter(|e| e.session_id == session_id)
            .map(|e| e.end_id)
            .collect();
        state.arrows.retain(|a| !end_ids.contains(&a.end_id));
        state.ends.retain(|e| e.session_id != session_id);
        state.entries.retain(|e| e.session_id != session_id);
        state.audits.retain(|a| a.session_id != session_id);
        Ok(())
    }

    async fn set_session_status(&self, session_id: i32, status: SessionStatus) -> Result<()> {
        let mut state = self.lock();
        if state.failing_status_writes.contains(&session_id) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or(StorageError::NotFound)?;
        session.status = status;
        Ok(())
    }

    async fn record_audit(&self, audit: &NewSessionAudit) -> Result<()> {
        let mut state = self.lock();
        if state.audit_missing {
            return Err(StorageError::Database(sqlx::Error::Protocol(
                "relation \"session_audit\" does not exist".to_string(),
            )));
        }
        let audit_id = state.next_id();
        state.audits.push(SessionAudit {
            audit_id,
            session_id: audit.session_id,
            old_status: audit.old_status,
            new_status: audit.new_status,
            changed_by: audit.changed_by,
            changed_at: now(),
        });
        Ok(())
    }

    async fn list_ends(&self, session_id: i32) -> Result<Vec<RecordedEnd>> {
        Ok(self.lock().recorded_ends(session_id))
    }

    async fn upsert_end(&self, session_id: i32, round_range_id: i32, end_no: i32) -> Result<i32> {
        let mut state = self.lock();
        if let Some(existing) = state.ends.iter().find(|e| {
            e.session_id == session_id && e.round_range_id == round_range_id && e.end_no == end_no
        }) {
            return Ok(existing.end_id);
        }
        let end_id = state.next_id();
        state.ends.push(StoredEnd {
            end_id,
            session_id,
            round_range_id,
            end_no,
        });
        Ok(end_id)
    }

    async fn upsert_arrow(&self, end_id: i32, arrow_no: i16, arrow_value: &str) -> Result<()> {
        let mut state = self.lock();
        match state
            .arrows
            .iter_mut()
            .find(|a| a.end_id == end_id && a.arrow_no == arrow_no)
        {
            Some(arrow) => arrow.arrow_value = arrow_value.to_string(),
            None => state.arrows.push(Arrow {
                end_id,
                arrow_no,
                arrow_value: arrow_value.to_string(),
            }),
        }
        Ok(())
    }

    async fn find_competition(&self, competition_id: i32) -> Result<Option<Competition>> {
        Ok(self
            .lock()
            .competitions
            .iter()
            .find(|c| c.competition_id == competition_id)
            .cloned())
    }

    async fn session_competition(&self, session_id: i32) -> Result<Option<Competition>> {
        let state = self.lock();
        Ok(state.competition_of(session_id).and_then(|id| {
            state
                .competitions
                .iter()
                .find(|c| c.competition_id == id)
                .cloned()
        }))
    }

    async fn create_competition_entry(&self, competition_id: i32, session_id: i32) -> Result<()> {
        if self.lock().competition_of(session_id).is_some() {
            return Err(StorageError::ConstraintViolation(
                "session is already entered in a competition".to_string(),
            ));
        }
        self.enter_competition(competition_id, session_id);
        Ok(())
    }

    async fn update_competition_entry(
        &self,
        session_id: i32,
        category_id: Option<i32>,
        final_total: i32,
    ) -> Result<()> {
        let mut state = self.lock();
        if state.failing_entry_writes.contains(&session_id) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.session_id == session_id)
            .ok_or(StorageError::NotFound)?;
        entry.category_id = category_id;
        entry.final_total = Some(final_total);
        Ok(())
    }

    async fn list_competition_entries(&self, competition_id: i32) -> Result<Vec<CompetitionEntry>> {
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|e| e.competition_id == competition_id)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.lock().categories.clone())
    }

    async fn find_championship(&self, championship_id: i32) -> Result<Option<Championship>> {
        Ok(self
            .lock()
            .championships
            .iter()
            .find(|c| c.championship_id == championship_id)
            .cloned())
    }

    async fn list_championship_rounds(
        &self,
        championship_id: i32,
    ) -> Result<Vec<ChampionshipRound>> {
        Ok(self
            .lock()
            .championship_rounds
            .iter()
            .filter(|r| r.championship_id == championship_id)
            .cloned()
            .collect())
    }

    async fn list_scored_sessions(
        &self,
        filter: &ScoredSessionFilter,
    ) -> Result<Vec<ScoredSession>> {
        let state = self.lock();
        let mut scored = Vec::new();

        for session in &state.sessions {
            let (Some(member), Some(round)) = (
                state.members.iter().find(|m| m.member_id == session.member_id),
                state.rounds.iter().find(|r| r.round_id == session.round_id),
            ) else {
                continue;
            };

            let ends = state.recorded_ends(session.session_id);
            let candidate = ScoredSession {
                session_id: session.session_id,
                member_id: member.member_id,
                full_name: member.full_name.clone(),
                av_number: member.av_number.clone(),
                gender_code: member.gender_code.clone(),
                birth_year: member.birth_year,
                division_code: session.division_code.clone(),
                round_id: round.round_id,
                round_name: round.round_name.clone(),
                shoot_date: session.shoot_date,
                status: session.status,
                ends_recorded: ends.len() as i64,
                arrow_values: ends
                    .iter()
                    .flat_map(|e| e.arrows.iter().map(|a| a.arrow_value.clone()))
                    .collect(),
            };

            if filter.matches(&candidate, state.competition_of(session.session_id)) {
                scored.push(candidate);
            }
        }

        scored.sort_by_key(|s| (s.shoot_date, s.session_id));
        Ok(scored)
    }
}
