//! Pattern Memory reducer
//!
//! A boolean grid of lit cells is shown briefly, then the user toggles the
//! cells they remember. Scored cell-by-cell against the target grid.

use crate::accuracy::SequenceComparison;
use crate::types::{NotReadyReason, ReduceOutcome, SessionMetrics};

/// Grid side length presented by capture (4x4)
pub const GRID_SIDE: usize = 4;

/// Reducer for Pattern Memory observations
pub struct PatternMemoryReducer;

impl PatternMemoryReducer {
    pub fn reduce(grid: &[bool], user_grid: &[bool], input_latencies_ms: &[u32]) -> ReduceOutcome {
        let cmp = SequenceComparison::new(grid, user_grid);
        match cmp.score() {
            Some(score) => ReduceOutcome::Ready {
                metrics: SessionMetrics {
                    reaction_avg: None,
                    memory_score: Some(score),
                    duration_ms: input_latencies_ms.iter().map(|&l| l as u64).sum(),
                    false_starts: None,
                },
            },
            None => ReduceOutcome::NotReady {
                reason: NotReadyReason::IncompleteResponse {
                    expected: cmp.target_len(),
                    actual: cmp.response_len(),
                },
            },
        }
    }
}
