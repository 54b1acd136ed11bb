use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::dto::report::{CompetitionSessionFilter, CompetitionSessionRow};
use crate::models::{ARROWS_PER_END, ArrowValue, Session, SessionStatus};
use crate::services::navigator::{NavigatorState, NavigatorStep};

/// Request payload for starting a scoring session
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSessionRequest {
    pub round_id: i32,

    /// Equipment used; defaults to the member's registered division.
    #[validate(length(min = 1, max = 8, message = "Division must be between 1 and 8 characters"))]
    pub division_code: Option<String>,

    /// Defaults to today.
    pub shoot_date: Option<NaiveDate>,

    pub competition_id: Option<i32>,
}

/// Arrows typed for one end, in slot order. Shorter than six is allowed while
/// the end is still being shot.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SaveEndRequest {
    pub range_idx: usize,

    #[validate(range(min = 1, message = "End numbers start at 1"))]
    pub end_no: i32,

    #[serde(default)]
    #[validate(length(max = 6, message = "An end holds at most 6 arrows"))]
    #[validate(custom(function = "validate_arrow_tokens"))]
    pub arrows: Vec<String>,
}

impl SaveEndRequest {
    pub fn state(&self) -> NavigatorState {
        NavigatorState {
            range_idx: self.range_idx,
            end_no: self.end_no,
        }
    }

    /// Strict parse of every slot.
    pub fn arrow_values(&self) -> crate::error::Result<Vec<ArrowValue>> {
        if self.arrows.len() > ARROWS_PER_END {
            return Err(crate::error::StorageError::Validation(format!(
                "an end holds at most {} arrows, got {}",
                ARROWS_PER_END,
                self.arrows.len()
            )));
        }
        self.arrows.iter().map(|a| a.parse()).collect()
    }
}

fn validate_arrow_tokens(arrows: &[String]) -> Result<(), ValidationError> {
    if arrows.iter().all(|a| a.parse::<ArrowValue>().is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("arrow_value")
            .with_message("Arrow values must be X, M or 1-10".into()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Required to submit a session with ends still missing.
    #[serde(default)]
    pub allow_incomplete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    pub status: SessionStatus,
}

/// Bulk status change over the sessions entered in a competition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkStatusRequest {
    pub target: SessionStatus,

    /// Only sessions currently in one of these statuses; empty means any.
    #[serde(default)]
    pub statuses: Vec<SessionStatus>,

    #[serde(default)]
    pub round_ids: Vec<i32>,

    /// Case-insensitive partial match on the AV number.
    #[validate(length(max = 32))]
    pub av_number: Option<String>,

    /// Restrict to these sessions among the matches; empty means all matches.
    #[serde(default)]
    pub session_ids: Vec<i32>,

    #[serde(default)]
    pub dry_run: bool,
}

impl BulkStatusRequest {
    pub fn filter(&self) -> CompetitionSessionFilter {
        CompetitionSessionFilter {
            statuses: self.statuses.clone(),
            round_ids: self.round_ids.clone(),
            av_number: self.av_number.clone(),
        }
    }
}

/// Matched sessions, split by whether they can still change, plus the report
/// when the change was actually applied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkStatusResponse {
    pub dry_run: bool,
    pub matched: Vec<CompetitionSessionRow>,
    pub editable: Vec<i32>,
    pub locked: Vec<i32>,
    pub report: Option<BulkTransitionReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AllowedActions {
    pub previous: bool,
    pub next: bool,
    pub submit: bool,
    pub delete: bool,
}

/// Everything needed to render the scoring screen for one end.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryView {
    pub session_id: i32,
    pub status: SessionStatus,
    pub state: NavigatorState,
    /// 1-based, for "Range 2 of 3".
    pub range_ordinal: usize,
    pub range_count: usize,
    pub distance_m: i32,
    pub face_size: i32,
    pub end_no: i32,
    pub ends_per_range: i32,
    pub arrows: Vec<String>,
    pub end_total: i32,
    pub session_total: i32,
    pub editable: bool,
    pub actions: AllowedActions,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoveResponse {
    pub step: NavigatorStep,
    pub entry: EntryView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionDetail {
    pub session: Session,
    pub round_name: String,
    pub competition_id: Option<i32>,
    pub total: i32,
    pub x_count: i32,
    pub ends_recorded: usize,
    pub total_ends: i32,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Updated {
        from: SessionStatus,
        to: SessionStatus,
    },
    AlreadyAtTarget,
    BlockedRevert {
        from: SessionStatus,
        to: SessionStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkFailure {
    pub session_id: i32,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkTransitionReport {
    pub target: SessionStatus,
    pub updated: usize,
    pub skipped_already_at_target: usize,
    pub skipped_blocked_revert: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkTransitionReport {
    pub fn new(target: SessionStatus) -> Self {
        Self {
            target,
            updated: 0,
            skipped_already_at_target: 0,
            skipped_blocked_revert: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn processed(&self) -> usize {
        self.updated + self.skipped_already_at_target + self.skipped_blocked_revert + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_end_request_validation() {
        let ok = SaveEndRequest {
            range_idx: 0,
            end_no: 1,
            arrows: vec!["X".into(), "9".into(), "m".into()],
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.arrow_values().unwrap()[2], ArrowValue::Miss);

        let bad_token = SaveEndRequest {
            arrows: vec!["11".into()],
            ..ok.clone()
        };
        assert!(bad_token.validate().is_err());
        assert!(bad_token.arrow_values().is_err());

        let too_many = SaveEndRequest {
            arrows: vec!["9".into(); 7],
            ..ok
        };
        assert!(too_many.validate().is_err());
    }
}
