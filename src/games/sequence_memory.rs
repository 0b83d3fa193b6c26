//! Memory Test reducer
//!
//! Capture flashes a color sequence, then the user reproduces it. Accuracy
//! only; per-input latencies, when measured, feed the duration telemetry.

use crate::accuracy::SequenceComparison;
use crate::types::{NotReadyReason, ReduceOutcome, SessionMetrics};

/// Default target sequence length (configurable 2-8 in the UI)
pub const DEFAULT_SEQUENCE_LEN: usize = 4;

/// Colors the capture layer draws sequence symbols from
pub const SYMBOL_PALETTE: [&str; 6] = ["red", "green", "blue", "yellow", "purple", "orange"];

/// Reducer for Memory Test observations
pub struct SequenceMemoryReducer;

impl SequenceMemoryReducer {
    pub fn reduce(
        sequence: &[String],
        user_seq: &[String],
        input_latencies_ms: &[u32],
    ) -> ReduceOutcome {
        let cmp = SequenceComparison::new(sequence, user_seq);
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
