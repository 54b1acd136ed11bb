use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::SessionStatus;
use super::arrow_value::{total_of, x_count_of};

/// A session joined with its archer and the raw arrow tokens, the input to
/// every leaderboard projection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoredSession {
    pub session_id: i32,
    pub member_id: i32,
    pub full_name: String,
    pub av_number: Option<String>,
    pub gender_code: String,
    pub birth_year: i32,
    pub division_code: String,
    pub round_id: i32,
    pub round_name: String,
    pub shoot_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub ends_recorded: i64,
    pub arrow_values: Vec<String>,
}

impl ScoredSession {
    pub fn total(&self) -> i32 {
        total_of(&self.arrow_values)
    }

    pub fn x_count(&self) -> i32 {
        x_count_of(&self.arrow_values)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoredSessionFilter {
    pub member_id: Option<i32>,
    pub round_ids: Vec<i32>,
    pub status: Option<SessionStatus>,
    pub competition_id: Option<i32>,
    pub shot_from: Option<NaiveDate>,
    pub shot_until: Option<NaiveDate>,
}

impl ScoredSessionFilter {
    pub fn confirmed() -> Self {
        Self {
            status: Some(SessionStatus::Confirmed),
            ..Self::default()
        }
    }

    pub fn matches(&self, session: &ScoredSession, competition_id: Option<i32>) -> bool {
        self.member_id.is_none_or(|m| m == session.member_id)
            && (self.round_ids.is_empty() || self.round_ids.contains(&session.round_id))
            && self.status.is_none_or(|s| s == session.status)
            && self
                .competition_id
                .is_none_or(|c| competition_id == Some(c))
            && self.shot_from.is_none_or(|d| session.shoot_date >= d)
            && self.shot_until.is_none_or(|d| session.shoot_date <= d)
    }
}
