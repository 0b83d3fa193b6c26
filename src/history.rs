//! Session history
//!
//! Rolling per-game window of recent session metrics. The classifier service
//! backfills absent metric fields from an account's recent sessions before
//! predicting; guest sessions have no server-side history, so the engine
//! keeps an on-device counterpart and applies the same backfill to predict
//! requests. Serializable so hosts can persist it across launches.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::contract::PredictRequest;
use crate::types::{GameKind, SessionMetrics};

/// Default history window, in sessions per game
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Fallback reaction average (ms) when no history exists, matching the
/// service's global default feature vector
pub const DEFAULT_REACTION_AVG: f64 = 300.0;

/// Fallback memory score when no history exists
pub const DEFAULT_MEMORY_SCORE: f64 = 50.0;

/// Rolling store of recent session metrics, windowed per game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistoryStore {
    /// Recent reaction averages per game (ms)
    reaction_values: HashMap<GameKind, VecDeque<f64>>,
    /// Recent memory scores per game (0-100)
    memory_values: HashMap<GameKind, VecDeque<f64>>,
    /// Maximum window size per game
    window_size: usize,
}

impl Default for SessionHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl SessionHistoryStore {
    /// Create an empty store with the specified per-game window size
    pub fn new(window_size: usize) -> Self {
        Self {
            reaction_values: HashMap::new(),
            memory_values: HashMap::new(),
            window_size,
        }
    }

    /// Record the metrics of a completed session. Absent fields are simply
    /// not recorded; a reaction session contributes nothing to the memory
    /// window and vice versa.
    pub fn record(&mut self, game: GameKind, metrics: &SessionMetrics) {
        if let Some(avg) = metrics.reaction_avg {
            let queue = self.reaction_values.entry(game).or_default();
            queue.push_back(f64::from(avg));
            while queue.len() > self.window_size {
                queue.pop_front();
            }
        }
        if let Some(score) = metrics.memory_score {
            let queue = self.memory_values.entry(game).or_default();
            queue.push_back(f64::from(score));
            while queue.len() > self.window_size {
                queue.pop_front();
            }
        }
    }

    /// Rolling mean reaction average for one game
    pub fn game_reaction_avg(&self, game: GameKind) -> Option<f64> {
        self.reaction_values.get(&game).and_then(Self::rolling_average)
    }

    /// Rolling mean memory score for one game
    pub fn game_memory_score(&self, game: GameKind) -> Option<f64> {
        self.memory_values.get(&game).and_then(Self::rolling_average)
    }

    /// Rolling mean reaction average pooled across every game, the same
    /// pooling the service applies when it backfills from account history
    pub fn overall_reaction_avg(&self) -> Option<f64> {
        Self::pooled_average(&self.reaction_values)
    }

    /// Rolling mean memory score pooled across every game
    pub fn overall_memory_score(&self) -> Option<f64> {
        Self::pooled_average(&self.memory_values)
    }

    /// Number of windowed sessions for one game
    pub fn sessions_recorded(&self, game: GameKind) -> usize {
        let reactions = self.reaction_values.get(&game).map_or(0, VecDeque::len);
        let memories = self.memory_values.get(&game).map_or(0, VecDeque::len);
        reactions.max(memories)
    }

    /// Fill absent fields of a predict request the way the service fills
    /// them for account holders: pooled rolling means when history exists,
    /// the global defaults otherwise. Present fields are left untouched.
    pub fn backfill_predict(&self, request: PredictRequest) -> PredictRequest {
        let reaction_avg = request.reaction_avg.or_else(|| {
            let avg = self.overall_reaction_avg().unwrap_or(DEFAULT_REACTION_AVG);
            Some(avg.round() as u32)
        });
        let memory_score = request.memory_score.or_else(|| {
            let score = self.overall_memory_score().unwrap_or(DEFAULT_MEMORY_SCORE);
            Some(score.round().clamp(0.0, 100.0) as u8)
        });
        PredictRequest {
            reaction_avg,
            memory_score,
        }
    }

    /// Drop all recorded history
    pub fn clear(&mut self) {
        self.reaction_values.clear();
        self.memory_values.clear();
    }

    fn rolling_average(queue: &VecDeque<f64>) -> Option<f64> {
        if queue.is_empty() {
            return None;
        }
        let sum: f64 = queue.iter().sum();
        Some(sum / queue.len() as f64)
    }

    fn pooled_average(map: &HashMap<GameKind, VecDeque<f64>>) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for queue in map.values() {
            sum += queue.iter().sum::<f64>();
            count += queue.len();
        }
        if count == 0 {
            return None;
        }
        Some(sum / count as f64)
    }

    /// Load a history store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the history store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_metrics(reaction_avg: Option<u32>, memory_score: Option<u8>) -> SessionMetrics {
        SessionMetrics {
            reaction_avg,
            memory_score,
            duration_ms: 1500,
            false_starts: None,
        }
    }

    #[test]
    fn test_rolling_window_caps_per_game() {
        let mut store = SessionHistoryStore::new(5);

        // Seven sessions, only the last five stay in the window
        for avg in [100, 200, 300, 400, 500, 600, 700] {
            store.record(GameKind::ReactionTest, &make_metrics(Some(avg), None));
        }

        // Mean of 300, 400, 500, 600, 700
        let mean = store.game_reaction_avg(GameKind::ReactionTest).unwrap();
        assert!((mean - 500.0).abs() < 0.001);
        assert_eq!(store.sessions_recorded(GameKind::ReactionTest), 5);
    }

    #[test]
    fn test_absent_fields_are_not_recorded() {
        let mut store = SessionHistoryStore::default();
        store.record(GameKind::ReactionTest, &make_metrics(Some(280), None));

        assert!(store.game_memory_score(GameKind::ReactionTest).is_none());
        assert!(store.overall_memory_score().is_none());
    }

    #[test]
    fn test_per_game_windows_stay_separate() {
        let mut store = SessionHistoryStore::default();
        store.record(GameKind::ReactionTest, &make_metrics(Some(200), None));
        store.record(GameKind::StroopTest, &make_metrics(Some(400), Some(80)));

        let reaction = store.game_reaction_avg(GameKind::ReactionTest).unwrap();
        let stroop = store.game_reaction_avg(GameKind::StroopTest).unwrap();
        assert!((reaction - 200.0).abs() < 0.001);
        assert!((stroop - 400.0).abs() < 0.001);

        // Pooled mean spans both games
        let overall = store.overall_reaction_avg().unwrap();
        assert!((overall - 300.0).abs() < 0.001);
    }

    #[test]
    fn test_backfill_uses_defaults_when_empty() {
        let store = SessionHistoryStore::default();
        let request = store.backfill_predict(PredictRequest {
            reaction_avg: None,
            memory_score: None,
        });
        assert_eq!(request.reaction_avg, Some(300));
        assert_eq!(request.memory_score, Some(50));
    }

    #[test]
    fn test_backfill_uses_rolling_means() {
        let mut store = SessionHistoryStore::default();
        store.record(GameKind::ReactionTest, &make_metrics(Some(200), None));
        store.record(GameKind::VisualSearch, &make_metrics(Some(300), None));
        store.record(GameKind::MemoryTest, &make_metrics(None, Some(67)));

        let request = store.backfill_predict(PredictRequest {
            reaction_avg: None,
            memory_score: None,
        });
        assert_eq!(request.reaction_avg, Some(250));
        assert_eq!(request.memory_score, Some(67));
    }

    #[test]
    fn test_backfill_leaves_present_fields_alone() {
        let mut store = SessionHistoryStore::default();
        store.record(GameKind::ReactionTest, &make_metrics(Some(200), None));

        let request = store.backfill_predict(PredictRequest {
            reaction_avg: Some(138),
            memory_score: None,
        });
        assert_eq!(request.reaction_avg, Some(138));
        assert_eq!(request.memory_score, Some(50));
    }

    #[test]
    fn test_clear_drops_history() {
        let mut store = SessionHistoryStore::default();
        store.record(GameKind::ReactionTest, &make_metrics(Some(200), Some(80)));
        store.clear();
        assert!(store.overall_reaction_avg().is_none());
        assert_eq!(store.sessions_recorded(GameKind::ReactionTest), 0);
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut store = SessionHistoryStore::new(3);
        store.record(GameKind::DualTask, &make_metrics(Some(338), Some(75)));

        let json = store.to_json().unwrap();
        let loaded = SessionHistoryStore::from_json(&json).unwrap();

        assert_eq!(
            store.game_reaction_avg(GameKind::DualTask),
            loaded.game_reaction_avg(GameKind::DualTask)
        );
        assert_eq!(
            store.game_memory_score(GameKind::DualTask),
            loaded.game_memory_score(GameKind::DualTask)
        );
    }
}
