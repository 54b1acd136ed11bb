use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Competition {
    pub competition_id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Competition {
    /// Scores entered in a competition freeze the day after it ends.
    pub fn is_locked_on(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompetitionEntry {
    pub entry_id: i32,
    pub competition_id: i32,
    pub session_id: i32,
    pub category_id: Option<i32>,
    pub final_total: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_only_after_end_date() {
        let comp = Competition {
            competition_id: 1,
            name: "Club Championship".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        };

        assert!(!comp.is_locked_on(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(!comp.is_locked_on(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()));
        assert!(comp.is_locked_on(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()));
    }
}
