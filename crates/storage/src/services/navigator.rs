use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Result, StorageError};
use crate::models::{RecordedEnd, RoundRange};

/// Position inside a round: which range (0-based, longest distance first) and
/// which end of that range (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NavigatorState {
    pub range_idx: usize,
    pub end_no: i32,
}

/// Outcome of moving forward one end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigatorStep {
    Moved {
        state: NavigatorState,
    },
    /// The previous range is finished and `state` is end 1 of the next one.
    RangeComplete {
        completed_range_idx: usize,
        state: NavigatorState,
    },
    /// The last end of the last range was left; `state` stays on it.
    RoundComplete {
        state: NavigatorState,
    },
}

impl NavigatorStep {
    pub fn state(&self) -> NavigatorState {
        match self {
            Self::Moved { state }
            | Self::RangeComplete { state, .. }
            | Self::RoundComplete { state } => *state,
        }
    }

    pub fn is_round_complete(&self) -> bool {
        matches!(self, Self::RoundComplete { .. })
    }
}

/// The distance/end structure of a round, ordered the way it is shot.
#[derive(Debug, Clone)]
pub struct RoundLayout {
    round_id: i32,
    ranges: Vec<RoundRange>,
}

impl RoundLayout {
    pub fn new(round_id: i32, mut ranges: Vec<RoundRange>) -> Result<Self> {
        if ranges.is_empty() {
            return Err(StorageError::Configuration(format!(
                "round {} has no ranges defined",
                round_id
            )));
        }
        if let Some(bad) = ranges.iter().find(|r| r.ends_per_range < 1) {
            return Err(StorageError::Configuration(format!(
                "range {} of round {} has no ends",
                bad.round_range_id, round_id
            )));
        }

        ranges.sort_by(|a, b| {
            b.distance_m
                .cmp(&a.distance_m)
                .then(a.round_range_id.cmp(&b.round_range_id))
        });

        Ok(Self { round_id, ranges })
    }

    pub fn round_id(&self) -> i32 {
        self.round_id
    }

    pub fn ranges(&self) -> &[RoundRange] {
        &self.ranges
    }

    pub fn total_ends(&self) -> i32 {
        self.ranges.iter().map(|r| r.ends_per_range).sum()
    }

    pub fn range_index_of(&self, round_range_id: i32) -> Option<usize> {
        self.ranges
            .iter()
            .position(|r| r.round_range_id == round_range_id)
    }

    pub fn start(&self) -> NavigatorState {
        NavigatorState {
            range_idx: 0,
            end_no: 1,
        }
    }

    pub fn final_position(&self) -> NavigatorState {
        let last = self.ranges.len() - 1;
        NavigatorState {
            range_idx: last,
            end_no: self.ranges[last].ends_per_range,
        }
    }

    pub fn current_range(&self, state: NavigatorState) -> Result<&RoundRange> {
        let range = self.ranges.get(state.range_idx).ok_or_else(|| {
            StorageError::Validation(format!(
                "range {} does not exist in round {}",
                state.range_idx + 1,
                self.round_id
            ))
        })?;

        if state.end_no < 1 || state.end_no > range.ends_per_range {
            return Err(StorageError::Validation(format!(
                "end {} does not exist at {} m ({} ends)",
                state.end_no, range.distance_m, range.ends_per_range
            )));
        }

        Ok(range)
    }

    pub fn goto_previous_end(&self, state: NavigatorState) -> Result<NavigatorState> {
        self.current_range(state)?;

        if state.end_no > 1 {
            return Ok(NavigatorState {
                end_no: state.end_no - 1,
                ..state
            });
        }

        if state.range_idx == 0 {
            return Ok(state);
        }

        let previous = state.range_idx - 1;
        Ok(NavigatorState {
            range_idx: previous,
            end_no: self.ranges[previous].ends_per_range,
        })
    }

    pub fn goto_next_end(&self, state: NavigatorState) -> Result<NavigatorStep> {
        let range = self.current_range(state)?;

        if state.end_no < range.ends_per_range {
            return Ok(NavigatorStep::Moved {
                state: NavigatorState {
                    end_no: state.end_no + 1,
                    ..state
                },
            });
        }

        if state.range_idx + 1 < self.ranges.len() {
            return Ok(NavigatorStep::RangeComplete {
                completed_range_idx: state.range_idx,
                state: NavigatorState {
                    range_idx: state.range_idx + 1,
                    end_no: 1,
                },
            });
        }

        Ok(NavigatorStep::RoundComplete { state })
    }

    /// First position whose end is missing or has fewer than six scored
    /// arrows; the final end when everything is filled in.
    pub fn resume(&self, ends: &[RecordedEnd]) -> NavigatorState {
        for (range_idx, range) in self.ranges.iter().enumerate() {
            for end_no in 1..=range.ends_per_range {
                let complete = ends
                    .iter()
                    .find(|e| e.round_range_id == range.round_range_id && e.end_no == end_no)
                    .is_some_and(RecordedEnd::is_complete);

                if !complete {
                    return NavigatorState { range_idx, end_no };
                }
            }
        }

        self.final_position()
    }
}
