//! Reaction Test reducer
//!
//! Five go-signal trials; the user presses as soon as the screen turns. The
//! only accuracy signal is the false-start count, so this game reports
//! `reaction_avg` alone.

use crate::timing::{self, TimingProfile, DEFAULT_MAX_RT_MS, DEFAULT_MIN_RT_MS, DEFAULT_MOTOR_BUFFER_MS};
use crate::types::{RawTrialEvent, ReduceOutcome, SessionMetrics};

/// Trials per session presented by capture
pub const TRIALS_PER_SESSION: usize = 5;

/// Reaction Test timing profile.
///
/// The /2 report divisor matches what this game has always sent to the
/// classifier; it is not independently justified and is pending product
/// review.
pub const PROFILE: TimingProfile = TimingProfile {
    min_rt_ms: DEFAULT_MIN_RT_MS,
    max_rt_ms: DEFAULT_MAX_RT_MS,
    motor_buffer_ms: DEFAULT_MOTOR_BUFFER_MS,
    report_divisor: 2,
};

/// Reducer for Reaction Test observations
pub struct ReactionReducer;

impl ReactionReducer {
    pub fn reduce(raw_events: &[RawTrialEvent], false_starts: u32) -> ReduceOutcome {
        if raw_events.is_empty() {
            return ReduceOutcome::NotReady {
                reason: crate::types::NotReadyReason::NoTimedTrials,
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
