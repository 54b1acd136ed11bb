use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::Result;
use crate::models::{ScoredSession, ScoredSessionFilter};

/// Raw material for the leaderboards: sessions with their archer and every
/// arrow token. Scoring happens in Rust, never in SQL.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn scored_sessions(&self, filter: &ScoredSessionFilter) -> Result<Vec<ScoredSession>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                s.id AS session_id,
                s.member_id,
                m.full_name,
                m.av_number,
                m.gender_code,
                m.birth_year,
                s.division_code,
                s.round_id,
                r.round_name,
                s.shoot_date,
                s.status,
                (SELECT COUNT(*) FROM "end" e WHERE e.session_id = s.id) AS ends_recorded,
                COALESCE(
                    (
                        SELECT array_agg(a.arrow_value ORDER BY e.round_range_id, e.end_no, a.arrow_no)
                        FROM "end" e
                        JOIN arrow a ON a.end_id = e.id
                        WHERE e.session_id = s.id
                    ),
                    ARRAY[]::TEXT[]
                ) AS arrow_values
            FROM session s
            INNER JOIN club_member m ON m.id = s.member_id
            INNER JOIN round r ON r.id = s.round_id
            WHERE 1=1
            "#,
        );

        if let Some(member_id) = filter.member_id {
            query.push(" AND s.member_id = ");
            query.push_bind(member_id);
        }

        if !filter.round_ids.is_empty() {
            query.push(" AND s.round_id = ANY(");
            query.push_bind(filter.round_ids.clone());
            query.push(")");
        }

        if let Some(status) = filter.status {
            query.push(" AND s.status = ");
            query.push_bind(status.as_str());
        }

        if let Some(competition_id) = filter.competition_id {
            query.push(
                " AND EXISTS (SELECT 1 FROM competition_entry ce WHERE ce.session_id = s.id AND ce.competition_id = ",
            );
            query.push_bind(competition_id);
            query.push(")");
        }

        if let Some(from) = filter.shot_from {
            query.push(" AND s.shoot_date >= ");
            query.push_bind(from);
        }

        if let Some(until) = filter.shot_until {
            query.push(" AND s.shoot_date <= ");
            query.push_bind(until);
        }

        query.push(" ORDER BY s.shoot_date, s.id");

        let sessions = query
            .build_query_as::<ScoredSession>()
            .fetch_all(self.pool)
            .await?;

        Ok(sessions)
    }
}
