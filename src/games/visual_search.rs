//! Visual Search reducer
//!
//! Each round scatters a 3x3 grid of symbols and times how long the user
//! takes to find the target cell. Timing only; no accuracy score.

use crate::timing::{self, TimingProfile};
use crate::types::{NotReadyReason, RawTrialEvent, ReduceOutcome, SessionMetrics};

/// Rounds per session presented by capture
pub const DEFAULT_ROUNDS: usize = 5;

/// Cells in the search grid (3x3)
pub const GRID_CELLS: usize = 9;

/// Visual Search timing profile.
///
/// The /6 report divisor is carried from what this game sent to the
/// classifier; like the Reaction Test's /2 it is unexplained and pending
/// product review.
pub const PROFILE: TimingProfile = TimingProfile {
    min_rt_ms: crate::timing::DEFAULT_MIN_RT_MS,
    max_rt_ms: crate::timing::DEFAULT_MAX_RT_MS,
    motor_buffer_ms: crate::timing::DEFAULT_MOTOR_BUFFER_MS,
    report_divisor: 6,
};

/// Reducer for Visual Search observations
pub struct VisualSearchReducer;

impl VisualSearchReducer {
    pub fn reduce(raw_events: &[RawTrialEvent], false_starts: u32) -> ReduceOutcome {
        if raw_events.is_empty() {
            return ReduceOutcome::NotReady {
                reason: NotReadyReason::NoTimedTrials,
            };
        }

        let raw: Vec<u32> = raw_events.iter().map(|e| e.latency_ms).collect();
        ReduceOutcome::Ready {
            metrics: SessionMetrics {
                reaction_avg: PROFILE.reported_average(&raw),
                memory_score: None,
                duration_ms: timing::sum_raw_ms(raw_events),
                false_starts: Some(false_starts),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_events(latencies: &[u32]) -> Vec<RawTrialEvent> {
        latencies
            .iter()
            .enumerate()
            .map(|(i, &l)| RawTrialEvent::new(i as u32, l))
            .collect()
    }

    #[test]
    fn test_reduce_applies_search_divisor() {
        let events = make_test_events(&[600, 720, 660]);
        let metrics = VisualSearchReducer::reduce(&events, 0);
        let metrics = metrics.metrics().unwrap();

        // Trim drops 720 -> mean(600, 660) = 630; round(630 / 6) = 105
        assert_eq!(metrics.reaction_avg, Some(105));
        assert_eq!(metrics.memory_score, None);
        assert_eq!(metrics.duration_ms, 1980);
    }

    #[test]
    fn test_zero_rounds_not_ready() {
        assert!(!VisualSearchReducer::reduce(&[], 0).is_ready());
    }
}
