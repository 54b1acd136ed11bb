use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Round {
    pub round_id: i32,
    pub round_name: String,
}

/// One distance segment of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoundRange {
    pub round_range_id: i32,
    pub round_id: i32,
    pub distance_m: i32,
    pub face_size: i32,
    pub ends_per_range: i32,
}
