use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Number of arrows shot in one end.
pub const ARROWS_PER_END: usize = 6;

/// Token stored for a slot that has not been scored yet.
pub const DEFAULT_TOKEN: &str = "M";

/// Scores a raw arrow token.
///
/// `X` counts as 10, `M` as 0 and `1`..`10` as their face value. Anything else,
/// including the empty string, scores 0. Case-insensitive and whitespace
/// tolerant, so it can be applied directly to stored column values.
///
/// ```
/// use storage::models::score_of;
///
/// assert_eq!(score_of("x"), 10);
/// assert_eq!(score_of(" 7 "), 7);
/// assert_eq!(score_of("11"), 0);
/// ```
pub fn score_of(token: &str) -> i32 {
    match token.trim().to_ascii_uppercase().as_str() {
        "X" => 10,
        "M" => 0,
        other => match other.parse::<i32>() {
            Ok(value @ 1..=10) => value,
            _ => 0,
        },
    }
}

/// Sum of [`score_of`] over a sequence of tokens.
pub fn total_of<I, S>(tokens: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens.into_iter().map(|t| score_of(t.as_ref())).sum()
}

/// Number of X arrows among the tokens.
pub fn x_count_of<I, S>(tokens: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter(|t| t.as_ref().trim().eq_ignore_ascii_case("X"))
        .count() as i32
}

/// A validated arrow value, used wherever a score is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ArrowValue {
    X,
    Ring(u8),
    #[default]
    Miss,
}

impl ArrowValue {
    /// Choices offered to a scorer, highest first.
    pub const CHOICES: [ArrowValue; 12] = [
        ArrowValue::X,
        ArrowValue::Ring(10),
        ArrowValue::Ring(9),
        ArrowValue::Ring(8),
        ArrowValue::Ring(7),
        ArrowValue::Ring(6),
        ArrowValue::Ring(5),
        ArrowValue::Ring(4),
        ArrowValue::Ring(3),
        ArrowValue::Ring(2),
        ArrowValue::Ring(1),
        ArrowValue::Miss,
    ];

    pub fn score(&self) -> i32 {
        match self {
            Self::X => 10,
            Self::Ring(n) => i32::from(*n),
            Self::Miss => 0,
        }
    }

    pub fn is_x(&self) -> bool {
        matches!(self, Self::X)
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    pub fn as_token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArrowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::Ring(n) => write!(f, "{}", n),
            Self::Miss => f.write_str("M"),
        }
    }
}

impl FromStr for ArrowValue {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        match token.as_str() {
            "X" => Ok(Self::X),
            "M" => Ok(Self::Miss),
            other => match other.parse::<u8>() {
                Ok(n @ 1..=10) => Ok(Self::Ring(n)),
                _ => Err(StorageError::Validation(format!(
                    "invalid arrow value '{}': expected X, M or 1-10",
                    s
                ))),
            },
        }
    }
}

impl TryFrom<String> for ArrowValue {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArrowValue> for String {
    fn from(value: ArrowValue) -> Self {
        value.to_string()
    }
}
