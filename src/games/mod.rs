//! Per-game reducers
//!
//! Six thin adapters over the shared timing and accuracy libraries. Each maps
//! one game's raw observations to [`SessionMetrics`](crate::types::SessionMetrics);
//! [`reduce`] dispatches on the observation union. Reducers are pure and total:
//! incomplete input comes back as [`ReduceOutcome::NotReady`], never as an error.

pub mod dual_task;
pub mod pattern_memory;
pub mod reaction;
pub mod sequence_memory;
pub mod stroop;
pub mod visual_search;

pub use dual_task::DualTaskReducer;
pub use pattern_memory::PatternMemoryReducer;
pub use reaction::ReactionReducer;
pub use sequence_memory::SequenceMemoryReducer;
pub use stroop::StroopReducer;
pub use visual_search::VisualSearchReducer;

use crate::error::EngineError;
use crate::timing::TimingProfile;
use crate::types::{GameKind, GameObservations, RawTrialEvent, ReduceOutcome};

/// Reduce one session's observations to metrics
pub fn reduce(observations: &GameObservations) -> ReduceOutcome {
    match observations {
        GameObservations::ReactionTest {
            raw_events,
            false_starts,
            ..
        } => ReactionReducer::reduce(raw_events, *false_starts),
        GameObservations::StroopTest {
            rounds,
            false_starts,
        } => StroopReducer::reduce(rounds, *false_starts),
        GameObservations::VisualSearch {
            raw_events,
            false_starts,
        } => VisualSearchReducer::reduce(raw_events, *false_starts),
        GameObservations::MemoryTest {
            sequence,
            user_seq,
            input_latencies_ms,
        } => SequenceMemoryReducer::reduce(sequence, user_seq, input_latencies_ms),
        GameObservations::PatternMemory {
            grid,
            user_grid,
            input_latencies_ms,
        } => PatternMemoryReducer::reduce(grid, user_grid, input_latencies_ms),
        GameObservations::DualTask {
            raw_events,
            memory_sequence,
            user_memory_input,
            false_starts,
        } => DualTaskReducer::reduce(raw_events, memory_sequence, user_memory_input, *false_starts),
    }
}

/// Timing profile for a game, `None` for the untimed memory games
pub fn profile_for(game: GameKind) -> Option<TimingProfile> {
    match game {
        GameKind::ReactionTest => Some(reaction::PROFILE),
        GameKind::StroopTest => Some(stroop::PROFILE),
        GameKind::VisualSearch => Some(visual_search::PROFILE),
        GameKind::MemoryTest | GameKind::PatternMemory => None,
        GameKind::DualTask => Some(dual_task::PROFILE),
    }
}

/// Structural validation of a session's observations.
///
/// Stricter than [`reduce`]: readiness gaps (too few trials, mismatched
/// lengths) come back from the reducers as [`ReduceOutcome::NotReady`], but
/// values no capture surface could legitimately emit are rejected here.
pub fn validate(observations: &GameObservations) -> Result<(), EngineError> {
    match observations {
        GameObservations::ReactionTest { raw_events, .. }
        | GameObservations::VisualSearch { raw_events, .. } => latencies_positive(raw_events),
        GameObservations::StroopTest { rounds, .. } => {
            if rounds.iter().any(|round| round.latency_ms == 0) {
                return Err(EngineError::InvalidObservations(
                    "round latency must be positive".to_string(),
                ));
            }
            Ok(())
        }
        GameObservations::MemoryTest {
            sequence, user_seq, ..
        } => {
            if sequence.iter().chain(user_seq.iter()).any(|s| s.is_empty()) {
                return Err(EngineError::InvalidObservations(
                    "sequence symbols must be non-empty".to_string(),
                ));
            }
            if user_seq.len() > sequence.len() {
                return Err(EngineError::InvalidObservations(format!(
                    "recall has {} symbols for a {}-symbol target",
                    user_seq.len(),
                    sequence.len()
                )));
            }
            Ok(())
        }
        GameObservations::PatternMemory {
            grid, user_grid, ..
        } => {
            let cells = pattern_memory::GRID_SIDE * pattern_memory::GRID_SIDE;
            for (name, flags) in [("grid", grid), ("user_grid", user_grid)] {
                if !flags.is_empty() && flags.len() != cells {
                    return Err(EngineError::InvalidObservations(format!(
                        "{} has {} cells, expected {}",
                        name,
                        flags.len(),
                        cells
                    )));
                }
            }
            Ok(())
        }
        GameObservations::DualTask {
            raw_events,
            memory_sequence,
            user_memory_input,
            ..
        } => {
            latencies_positive(raw_events)?;
            let (lo, hi) = dual_task::DIGIT_RANGE;
            if memory_sequence
                .iter()
                .chain(user_memory_input.iter())
                .any(|digit| *digit < lo || *digit > hi)
            {
                return Err(EngineError::InvalidObservations(format!(
                    "digit outside the {lo}-{hi} range"
                )));
            }
            if user_memory_input.len() > memory_sequence.len() {
                return Err(EngineError::InvalidObservations(format!(
                    "recall has {} digits for a {}-digit target",
                    user_memory_input.len(),
                    memory_sequence.len()
                )));
            }
            Ok(())
        }
    }
}

fn latencies_positive(events: &[RawTrialEvent]) -> Result<(), EngineError> {
    if events.iter().any(|event| event.latency_ms == 0) {
        return Err(EngineError::InvalidObservations(
            "trial latency must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawTrialEvent, SessionMetrics, StroopRound};

    /// Ready metrics must carry exactly the fields the game owns
    fn metrics_match_game(game: GameKind, metrics: &SessionMetrics) -> bool {
        metrics.reaction_avg.is_some() == game.is_timed()
            && metrics.memory_score.is_some() == game.is_scored()
    }

    fn make_test_observations(game: GameKind) -> GameObservations {
        let raw_events = vec![
            RawTrialEvent::new(0, 310),
            RawTrialEvent::new(1, 290),
            RawTrialEvent::new(2, 480),
        ];
        match game {
            GameKind::ReactionTest => GameObservations::ReactionTest {
                raw_events,
                false_starts: 0,
                input: "mouse+keyboard".to_string(),
            },
            GameKind::StroopTest => GameObservations::StroopTest {
                rounds: vec![
                    StroopRound {
                        latency_ms: 420,
                        correct: true,
                    },
                    StroopRound {
                        latency_ms: 510,
                        correct: false,
                    },
                ],
                false_starts: 0,
            },
            GameKind::VisualSearch => GameObservations::VisualSearch {
                raw_events,
                false_starts: 0,
            },
            GameKind::MemoryTest => GameObservations::MemoryTest {
                sequence: vec!["red".into(), "green".into()],
                user_seq: vec!["red".into(), "green".into()],
                input_latencies_ms: vec![],
            },
            GameKind::PatternMemory => {
                let grid: Vec<bool> = (0..16).map(|i| i % 3 == 0).collect();
                GameObservations::PatternMemory {
                    user_grid: grid.clone(),
                    grid,
                    input_latencies_ms: vec![],
                }
            }
            GameKind::DualTask => GameObservations::DualTask {
                raw_events,
                memory_sequence: vec![3, 7, 1],
                user_memory_input: vec![3, 7, 1],
                false_starts: 0,
            },
        }
    }

    #[test]
    fn test_every_game_reduces_to_matching_metrics() {
        for game in GameKind::all() {
            let obs = make_test_observations(game);
            let outcome = reduce(&obs);
            let metrics = outcome
                .metrics()
                .unwrap_or_else(|| panic!("{game} should be ready"));

            // At least one metric present, and exactly the ones the game owns
            assert!(metrics.reaction_avg.is_some() || metrics.memory_score.is_some());
            assert!(metrics_match_game(game, metrics), "{game}");
        }
    }

    #[test]
    fn test_timed_games_have_profiles() {
        for game in GameKind::all() {
            assert_eq!(profile_for(game).is_some(), game.is_timed(), "{game}");
        }
    }

    #[test]
    fn test_dispatch_uses_per_game_divisors() {
        let obs = make_test_observations(GameKind::ReactionTest);
        let reaction = reduce(&obs).metrics().unwrap().reaction_avg.unwrap();

        let obs = make_test_observations(GameKind::VisualSearch);
        let search = reduce(&obs).metrics().unwrap().reaction_avg.unwrap();

        // Same latencies, different report divisors (2 vs 6)
        assert_eq!(reaction, 150);
        assert_eq!(search, 50);
    }

    #[test]
    fn test_well_formed_observations_validate() {
        for game in GameKind::all() {
            assert!(validate(&make_test_observations(game)).is_ok(), "{game}");
        }
    }

    #[test]
    fn test_zero_latency_is_rejected() {
        let obs = GameObservations::ReactionTest {
            raw_events: vec![RawTrialEvent::new(0, 0)],
            false_starts: 0,
            input: "mouse".to_string(),
        };
        assert!(matches!(
            validate(&obs),
            Err(EngineError::InvalidObservations(_))
        ));

        let obs = GameObservations::StroopTest {
            rounds: vec![StroopRound {
                latency_ms: 0,
                correct: true,
            }],
            false_starts: 0,
        };
        assert!(validate(&obs).is_err());
    }

    #[test]
    fn test_empty_symbol_is_rejected() {
        let obs = GameObservations::MemoryTest {
            sequence: vec!["red".into(), String::new()],
            user_seq: vec!["red".into()],
            input_latencies_ms: vec![],
        };
        assert!(validate(&obs).is_err());
    }

    #[test]
    fn test_overlong_recall_is_rejected() {
        let obs = GameObservations::MemoryTest {
            sequence: vec!["red".into()],
            user_seq: vec!["red".into(), "green".into()],
            input_latencies_ms: vec![],
        };
        assert!(validate(&obs).is_err());

        let obs = GameObservations::DualTask {
            raw_events: vec![RawTrialEvent::new(0, 400)],
            memory_sequence: vec![3],
            user_memory_input: vec![3, 7],
            false_starts: 0,
        };
        assert!(validate(&obs).is_err());
    }

    #[test]
    fn test_wrong_grid_size_is_rejected() {
        let obs = GameObservations::PatternMemory {
            grid: vec![true, false, true],
            user_grid: vec![],
            input_latencies_ms: vec![],
        };
        assert!(validate(&obs).is_err());

        // An untouched response grid is a readiness gap, not a defect
        let obs = GameObservations::PatternMemory {
            grid: (0..16).map(|i| i % 2 == 0).collect(),
            user_grid: vec![],
            input_latencies_ms: vec![],
        };
        assert!(validate(&obs).is_ok());
    }

    #[test]
    fn test_out_of_range_digit_is_rejected() {
        let obs = GameObservations::DualTask {
            raw_events: vec![RawTrialEvent::new(0, 400)],
            memory_sequence: vec![3, 0],
            user_memory_input: vec![],
            false_starts: 0,
        };
        assert!(validate(&obs).is_err());
    }
}
