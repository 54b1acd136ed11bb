use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::{Category, Championship, ChampionshipRound, Competition, CompetitionEntry};

/// Repository for competitions, their entries and the category table
pub struct CompetitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, competition_id: i32) -> Result<Option<Competition>> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            SELECT id AS competition_id, name, start_date, end_date
            FROM competition
            WHERE id = $1
            "#,
        )
        .bind(competition_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(competition)
    }

    /// Competition a session is entered in, if any
    pub async fn find_for_session(&self, session_id: i32) -> Result<Option<Competition>> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            SELECT c.id AS competition_id, c.name, c.start_date, c.end_date
            FROM competition c
            JOIN competition_entry ce ON ce.competition_id = c.id
            WHERE ce.session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(competition)
    }

    pub async fn create_entry(&self, competition_id: i32, session_id: i32) -> Result<()> {
        sqlx::query("INSERT INTO competition_entry (competition_id, session_id) VALUES ($1, $2)")
            .bind(competition_id)
            .bind(session_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_unique_violation() {
                    StorageError::ConstraintViolation(format!(
                        "session {} is already entered in a competition",
                        session_id
                    ))
                } else {
                    err
                }
            })?;

        Ok(())
    }

    pub async fn update_entry(
        &self,
        session_id: i32,
        category_id: Option<i32>,
        final_total: i32,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE competition_entry
            SET category_id = $2, final_total = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .bind(category_id)
        .bind(final_total)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    pub async fn list_entries(&self, competition_id: i32) -> Result<Vec<CompetitionEntry>> {
        let entries = sqlx::query_as::<_, CompetitionEntry>(
            r#"
            SELECT id AS entry_id, competition_id, session_id, category_id, final_total
            FROM competition_entry
            WHERE competition_id = $1
            ORDER BY id
            "#,
        )
        .bind(competition_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id AS category_id, name, age_class_code, gender_code, division_code,
                   min_birth_year, max_birth_year
            FROM category
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find_championship(&self, championship_id: i32) -> Result<Option<Championship>> {
        let championship = sqlx::query_as::<_, Championship>(
            r#"
            SELECT id AS championship_id, name, season_start, season_end
            FROM championship
            WHERE id = $1
            "#,
        )
        .bind(championship_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(championship)
    }

    pub async fn list_championship_rounds(
        &self,
        championship_id: i32,
    ) -> Result<Vec<ChampionshipRound>> {
        let rounds = sqlx::query_as::<_, ChampionshipRound>(
            r#"
            SELECT championship_id, round_id, best_of
            FROM championship_round
            WHERE championship_id = $1
            ORDER BY round_id
            "#,
        )
        .bind(championship_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rounds)
    }
}
