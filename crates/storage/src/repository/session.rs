use std::collections::HashMap;

use sqlx::{FromRow, PgPool};

use crate::error::{Result, StorageError};
use crate::models::{Arrow, NewSession, NewSessionAudit, RecordedEnd, Session, SessionStatus};

const SESSION_COLUMNS: &str =
    "id AS session_id, member_id, round_id, division_code, shoot_date, status, created_at";

#[derive(FromRow)]
struct EndRow {
    end_id: i32,
    session_id: i32,
    round_range_id: i32,
    end_no: i32,
}

/// Repository for sessions, their ends and arrows, and the status audit log
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new session in Preliminary status
    pub async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO session (member_id, round_id, division_code, shoot_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(new_session.member_id)
        .bind(new_session.round_id)
        .bind(&new_session.division_code)
        .bind(new_session.shoot_date)
        .bind(SessionStatus::Preliminary.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_foreign_key_violation() {
                StorageError::Validation("unknown member or round".to_string())
            } else {
                err
            }
        })?;

        Ok(session)
    }

    pub async fn find_by_id(&self, session_id: i32) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {} FROM session WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    /// Ends, arrows, audit rows and the competition entry go with it.
    pub async fn delete(&self, session_id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM session WHERE id = $1")
            .bind(session_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    pub async fn set_status(&self, session_id: i32, status: SessionStatus) -> Result<()> {
        let result = sqlx::query("UPDATE session SET status = $2 WHERE id = $1")
            .bind(session_id)
            .bind(status.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    pub async fn record_audit(&self, audit: &NewSessionAudit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_audit (session_id, old_status, new_status, changed_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(audit.session_id)
        .bind(audit.old_status.as_str())
        .bind(audit.new_status.as_str())
        .bind(audit.changed_by)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Ends of a session with their arrows, ordered by range then end number
    pub async fn list_ends(&self, session_id: i32) -> Result<Vec<RecordedEnd>> {
        let ends = sqlx::query_as::<_, EndRow>(
            r#"
            SELECT id AS end_id, session_id, round_range_id, end_no
            FROM "end"
            WHERE session_id = $1
            ORDER BY round_range_id, end_no
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        let arrows = sqlx::query_as::<_, Arrow>(
            r#"
            SELECT a.end_id, a.arrow_no, a.arrow_value
            FROM arrow a
            JOIN "end" e ON e.id = a.end_id
            WHERE e.session_id = $1
            ORDER BY a.end_id, a.arrow_no
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        let mut by_end: HashMap<i32, Vec<Arrow>> = HashMap::new();
        for arrow in arrows {
            by_end.entry(arrow.end_id).or_default().push(arrow);
        }

        Ok(ends
            .into_iter()
            .map(|row| RecordedEnd {
                arrows: by_end.remove(&row.end_id).unwrap_or_default(),
                end_id: row.end_id,
                session_id: row.session_id,
                round_range_id: row.round_range_id,
                end_no: row.end_no,
            })
            .collect())
    }

    /// Returns the id of the end, creating it on first use.
    pub async fn upsert_end(&self, session_id: i32, round_range_id: i32, end_no: i32) -> Result<i32> {
        let end_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO "end" (session_id, round_range_id, end_no)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id, round_range_id, end_no)
            DO UPDATE SET end_no = EXCLUDED.end_no
            RETURNING id
            "#,
        )
        .bind(session_id)
        .bind(round_range_id)
        .bind(end_no)
        .fetch_one(self.pool)
        .await?;

        Ok(end_id)
    }

    pub async fn upsert_arrow(&self, end_id: i32, arrow_no: i16, arrow_value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO arrow (end_id, arrow_no, arrow_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (end_id, arrow_no)
            DO UPDATE SET arrow_value = EXCLUDED.arrow_value
            "#,
        )
        .bind(end_id)
        .bind(arrow_no)
        .bind(arrow_value)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
