use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{RoundRange, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PersonalBest {
    pub round_id: i32,
    pub round_name: String,
    pub session_id: i32,
    pub score: i32,
    pub x_count: i32,
    pub shoot_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClubRecord {
    pub round_id: i32,
    pub round_name: String,
    pub category_id: i32,
    pub category_name: String,
    pub session_id: i32,
    pub member_id: i32,
    pub full_name: String,
    pub av_number: Option<String>,
    pub score: i32,
    pub shoot_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountedRound {
    pub round_id: i32,
    pub best_of: i32,
    /// Highest first, at most `best_of` of them.
    pub scores: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LadderRow {
    /// Standard competition ranking; `None` while a required round is missing.
    pub rank: Option<u32>,
    pub member_id: i32,
    pub full_name: String,
    pub av_number: Option<String>,
    pub championship_score: i32,
    pub complete: bool,
    pub counted: Vec<CountedRound>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChampionshipLadder {
    pub championship_id: i32,
    pub name: String,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
    pub rows: Vec<LadderRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompetitionResultRow {
    pub rank: u32,
    pub session_id: i32,
    pub member_id: i32,
    pub full_name: String,
    pub av_number: Option<String>,
    pub round_name: String,
    pub total: i32,
    pub x_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResults {
    pub category_id: Option<i32>,
    pub category_name: String,
    pub rows: Vec<CompetitionResultRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionResults {
    pub competition_id: i32,
    pub name: String,
    pub categories: Vec<CategoryResults>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum HistoryBucket {
    /// Preliminary with ends still missing.
    Unfinished,
    /// Preliminary with every end recorded.
    Submitted,
    Final,
    Confirmed,
}

impl HistoryBucket {
    pub fn classify(status: SessionStatus, ends_recorded: i64, total_ends: i32) -> Self {
        match status {
            SessionStatus::Confirmed => Self::Confirmed,
            SessionStatus::Final => Self::Final,
            SessionStatus::Preliminary if ends_recorded < i64::from(total_ends) => Self::Unfinished,
            SessionStatus::Preliminary => Self::Submitted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoreHistoryRow {
    pub session_id: i32,
    pub shoot_date: NaiveDate,
    pub round_id: i32,
    pub round_name: String,
    pub status: SessionStatus,
    pub bucket: HistoryBucket,
    pub ends_recorded: i64,
    pub total_ends: i32,
    pub total: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoundDefinition {
    pub round_id: i32,
    pub round_name: String,
    pub ranges: Vec<RoundRange>,
    pub total_ends: i32,
    pub total_arrows: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionSessionRow {
    pub session_id: i32,
    pub member_id: i32,
    pub full_name: String,
    pub av_number: Option<String>,
    pub round_id: i32,
    pub round_name: String,
    pub shoot_date: NaiveDate,
    pub status: SessionStatus,
    pub total: i32,
    pub locked: bool,
}

/// Narrowing applied to a competition's sessions on the approval screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompetitionSessionFilter {
    #[serde(default)]
    pub statuses: Vec<SessionStatus>,
    #[serde(default)]
    pub round_ids: Vec<i32>,
    pub av_number: Option<String>,
}

impl CompetitionSessionFilter {
    pub fn matches(&self, status: SessionStatus, av_number: Option<&str>) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&status);
        let av_ok = match self.av_number.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => av_number.is_some_and(|av| {
                av.to_ascii_lowercase()
                    .contains(&needle.to_ascii_lowercase())
            }),
        };
        status_ok && av_ok
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionTotal {
    pub session_id: i32,
    pub total: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_buckets() {
        assert_eq!(
            HistoryBucket::classify(SessionStatus::Preliminary, 3, 10),
            HistoryBucket::Unfinished
        );
        assert_eq!(
            HistoryBucket::classify(SessionStatus::Preliminary, 10, 10),
            HistoryBucket::Submitted
        );
        assert_eq!(
            HistoryBucket::classify(SessionStatus::Final, 2, 10),
            HistoryBucket::Final
        );
    }

    #[test]
    fn test_av_filter_is_partial_and_case_insensitive() {
        let filter = CompetitionSessionFilter {
            av_number: Some("vic1".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(SessionStatus::Final, Some("VIC123")));
        assert!(!filter.matches(SessionStatus::Final, Some("VIC200")));
        assert!(!filter.matches(SessionStatus::Final, None));
        assert!(CompetitionSessionFilter::default().matches(SessionStatus::Final, None));
    }
}
