use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StorageError;

/// Lifecycle of a scoring session. Variants are declared in the only order a
/// session may move through them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum SessionStatus {
    /// Draft, editable by the archer.
    Preliminary,
    /// Submitted, awaiting a recorder.
    Final,
    /// Official.
    Confirmed,
}

/// Result of checking a requested status change against the forward-only rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    Apply,
    AlreadyAtTarget,
    ForbiddenRevert,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 3] = [Self::Preliminary, Self::Final, Self::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preliminary => "Preliminary",
            Self::Final => "Final",
            Self::Confirmed => "Confirmed",
        }
    }

    pub fn check_transition(self, to: SessionStatus) -> TransitionCheck {
        match self.cmp(&to) {
            std::cmp::Ordering::Less => TransitionCheck::Apply,
            std::cmp::Ordering::Equal => TransitionCheck::AlreadyAtTarget,
            std::cmp::Ordering::Greater => TransitionCheck::ForbiddenRevert,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preliminary" => Ok(Self::Preliminary),
            "final" => Ok(Self::Final),
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(StorageError::Validation(format!(
                "unknown session status '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
