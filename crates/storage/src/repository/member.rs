use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::Member;

const MEMBER_COLUMNS: &str = r#"
    id AS member_id, full_name, av_number, gender_code, division_code,
    birth_year, is_recorder, created_at
"#;

/// Repository for club member lookups
pub struct MemberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MemberRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, member_id: i32) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM club_member WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(member_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(member)
    }

    pub async fn list(&self) -> Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM club_member ORDER BY full_name",
            MEMBER_COLUMNS
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(members)
    }

    pub async fn av_number_exists(&self, av_number: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM club_member WHERE av_number = $1)",
        )
        .bind(av_number)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Fails with a unique violation when another member already holds the
    /// number.
    pub async fn set_av_number(&self, member_id: i32, av_number: &str) -> Result<()> {
        let result = sqlx::query("UPDATE club_member SET av_number = $2 WHERE id = $1")
            .bind(member_id)
            .bind(av_number)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
