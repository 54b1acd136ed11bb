use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::SessionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SessionAudit {
    pub audit_id: i32,
    pub session_id: i32,
    #[sqlx(try_from = "String")]
    pub old_status: SessionStatus,
    #[sqlx(try_from = "String")]
    pub new_status: SessionStatus,
    pub changed_by: Option<i32>,
    pub changed_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSessionAudit {
    pub session_id: i32,
    pub old_status: SessionStatus,
    pub new_status: SessionStatus,
    pub changed_by: Option<i32>,
}
