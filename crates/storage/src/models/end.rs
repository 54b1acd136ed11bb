use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::arrow_value::{ARROWS_PER_END, DEFAULT_TOKEN, score_of};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Arrow {
    pub end_id: i32,
    pub arrow_no: i16,
    pub arrow_value: String,
}

/// An end as stored, with whatever arrow rows exist for it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordedEnd {
    pub end_id: i32,
    pub session_id: i32,
    pub round_range_id: i32,
    pub end_no: i32,
    pub arrows: Vec<Arrow>,
}

impl RecordedEnd {
    /// Arrow tokens in slot order, missing slots filled with `M`.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![DEFAULT_TOKEN.to_string(); ARROWS_PER_END];
        for arrow in &self.arrows {
            let slot = arrow.arrow_no as usize;
            if (1..=ARROWS_PER_END).contains(&slot) {
                tokens[slot - 1] = arrow.arrow_value.clone();
            }
        }
        tokens
    }

    pub fn total(&self) -> i32 {
        self.arrows.iter().map(|a| score_of(&a.arrow_value)).sum()
    }

    /// Arrows holding something other than the default token.
    pub fn scored_arrow_count(&self) -> usize {
        self.arrows
            .iter()
            .filter(|a| !a.arrow_value.trim().eq_ignore_ascii_case(DEFAULT_TOKEN))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.scored_arrow_count() >= ARROWS_PER_END
    }

    /// Every slot has a stored arrow row, misses included.
    pub fn is_fully_entered(&self) -> bool {
        self.arrows.len() >= ARROWS_PER_END
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_with(values: &[(i16, &str)]) -> RecordedEnd {
        RecordedEnd {
            end_id: 1,
            session_id: 1,
            round_range_id: 1,
            end_no: 1,
            arrows: values
                .iter()
                .map(|(no, v)| Arrow {
                    end_id: 1,
                    arrow_no: *no,
                    arrow_value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_tokens_pad_missing_slots() {
        let end = end_with(&[(1, "X"), (3, "9")]);
        assert_eq!(end.tokens(), vec!["X", "M", "9", "M", "M", "M"]);
        assert_eq!(end.total(), 19);
    }

    #[test]
    fn test_completeness_ignores_default_tokens() {
        let full = end_with(&[(1, "X"), (2, "9"), (3, "9"), (4, "8"), (5, "7"), (6, "1")]);
        assert!(full.is_complete());

        let with_miss = end_with(&[(1, "X"), (2, "9"), (3, "9"), (4, "8"), (5, "M"), (6, "7")]);
        assert_eq!(with_miss.scored_arrow_count(), 5);
        assert!(!with_miss.is_complete());
        assert!(with_miss.is_fully_entered());
        assert_eq!(with_miss.total(), 43);

        assert!(!end_with(&[(1, "X"), (2, "9")]).is_fully_entered());
    }
}
