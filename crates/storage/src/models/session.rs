use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::SessionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Session {
    pub session_id: i32,
    pub member_id: i32,
    pub round_id: i32,
    pub division_code: String,
    pub shoot_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub member_id: i32,
    pub round_id: i32,
    pub division_code: String,
    pub shoot_date: NaiveDate,
}
