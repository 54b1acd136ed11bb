use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub member_id: i32,
    pub full_name: String,
    pub av_number: Option<String>,
    pub gender_code: String,
    pub division_code: String,
    pub birth_year: i32,
    pub is_recorder: bool,
    pub created_at: chrono::NaiveDateTime,
}
