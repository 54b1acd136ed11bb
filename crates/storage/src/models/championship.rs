use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Championship {
    pub championship_id: i32,
    pub name: String,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
}

/// A round every archer must shoot; the best `best_of` confirmed totals count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ChampionshipRound {
    pub championship_id: i32,
    pub round_id: i32,
    pub best_of: i32,
}
