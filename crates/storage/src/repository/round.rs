use sqlx::PgPool;

use crate::error::Result;
use crate::models::{Round, RoundRange};

/// Repository for round templates, which are read-only reference data
pub struct RoundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoundRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, round_id: i32) -> Result<Option<Round>> {
        let round = sqlx::query_as::<_, Round>(
            "SELECT id AS round_id, round_name FROM round WHERE id = $1",
        )
        .bind(round_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(round)
    }

    pub async fn list(&self) -> Result<Vec<Round>> {
        let rounds = sqlx::query_as::<_, Round>(
            "SELECT id AS round_id, round_name FROM round ORDER BY round_name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rounds)
    }

    /// Ranges in shooting order: longest distance first.
    pub async fn list_ranges(&self, round_id: i32) -> Result<Vec<RoundRange>> {
        let ranges = sqlx::query_as::<_, RoundRange>(
            r#"
            SELECT id AS round_range_id, round_id, distance_m, face_size, ends_per_range
            FROM round_range
            WHERE round_id = $1
            ORDER BY distance_m DESC, id
            "#,
        )
        .bind(round_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ranges)
    }
}
