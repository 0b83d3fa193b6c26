//! Pipeline orchestration
//!
//! This module provides the public API for the PlayWell engine. It ties the
//! per-game reducers, the session history window, and the recommendation
//! rule engine together behind JSON entry points.

use crate::contract::PredictRequest;
use crate::error::EngineError;
use crate::games;
use crate::history::SessionHistoryStore;
use crate::recommend::{RecommendationEngine, SelectionPolicy};
use crate::types::{ClassificationResult, GameObservations, ReduceOutcome, SessionMetrics};

/// Reduce one game session's observation JSON to metrics (stateless,
/// one-shot).
///
/// # Arguments
/// * `observations_json` - Tagged observation payload (`gameType` selects the
///   game)
///
/// # Returns
/// JSON outcome: `{"status":"ready","metrics":{...}}`, or
/// `{"status":"not_ready","reason":{...}}` when the capture is incomplete
///
/// # Example
/// ```ignore
/// let outcome = score_session_json(observations_json)?;
/// ```
pub fn score_session_json(observations_json: &str) -> Result<String, EngineError> {
    // Stage 1: Parse observation JSON
    let observations: GameObservations = serde_json::from_str(observations_json)?;

    // Stage 2: Reduce to session metrics
    let outcome = games::reduce(&observations);

    // Stage 3: Encode the outcome
    serde_json::to_string(&outcome).map_err(EngineError::from)
}

/// Derive recommendations for a classification (stateless, one-shot).
///
/// # Arguments
/// * `classification_json` - `{"stress_level": ..., "cognitive_score": ...}`
///
/// # Returns
/// JSON array of recommendation strings, using the deterministic
/// all-matching policy
pub fn recommendations_json(classification_json: &str) -> Result<String, EngineError> {
    // Stage 1: Parse the classification
    let classification: ClassificationResult = serde_json::from_str(classification_json)?;

    // Stage 2: Run the rule table
    let engine = RecommendationEngine::new();
    let recommendations = engine.recommend(
        classification.stress_level,
        classification.cognitive_score,
    );

    // Stage 3: Encode the list
    serde_json::to_string(&recommendations).map_err(EngineError::from)
}

/// Stateful processor with a persistent session history window.
///
/// Use this when sessions arrive over time and guest predict requests should
/// be backfilled from the history the way the service backfills from account
/// history.
pub struct SessionProcessor {
    history: SessionHistoryStore,
    engine: RecommendationEngine,
}

impl Default for SessionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProcessor {
    /// Create a new processor with default settings (5 session history
    /// window, deterministic recommendation policy)
    pub fn new() -> Self {
        Self {
            history: SessionHistoryStore::default(),
            engine: RecommendationEngine::new(),
        }
    }

    /// Create a processor with a specific history window size (number of
    /// sessions per game)
    pub fn with_history_window(sessions: usize) -> Self {
        Self {
            history: SessionHistoryStore::new(sessions),
            engine: RecommendationEngine::new(),
        }
    }

    /// Replace the recommendation selection policy
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.engine = RecommendationEngine::with_policy(policy);
        self
    }

    /// Reduce one session's observation JSON and fold ready metrics into the
    /// history window.
    ///
    /// # Arguments
    /// * `observations_json` - Tagged observation payload
    ///
    /// # Returns
    /// The same JSON outcome as [`score_session_json`]
    pub fn process(&mut self, observations_json: &str) -> Result<String, EngineError> {
        // Stage 1: Parse observation JSON
        let observations: GameObservations = serde_json::from_str(observations_json)?;

        // Stage 2: Reduce to session metrics
        let outcome = games::reduce(&observations);

        // Stage 3: Fold ready metrics into the history window
        if let ReduceOutcome::Ready { metrics } = &outcome {
            self.history.record(observations.game(), metrics);
        }

        // Stage 4: Encode the outcome
        serde_json::to_string(&outcome).map_err(EngineError::from)
    }

    /// Recommendations under the configured selection policy
    pub fn recommend(
        &self,
        classification: &ClassificationResult,
    ) -> Vec<String> {
        self.engine.recommend(
            classification.stress_level,
            classification.cognitive_score,
        )
    }

    /// Guest predict request for reduced metrics, with absent fields
    /// backfilled from the history window
    pub fn predict_request_for(&self, metrics: &SessionMetrics) -> PredictRequest {
        self.history.backfill_predict(PredictRequest::from_metrics(metrics))
    }

    /// Save history state to JSON for persistence
    pub fn save_history(&self) -> Result<String, EngineError> {
        self.history
            .to_json()
            .map_err(|e| EngineError::EncodingError(e.to_string()))
    }

    /// Load history state from JSON
    pub fn load_history(&mut self, json: &str) -> Result<(), EngineError> {
        self.history = SessionHistoryStore::from_json(json)
            .map_err(|e| EngineError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Number of windowed sessions for one game
    pub fn history_session_count(&self, game: crate::types::GameKind) -> usize {
        self.history.sessions_recorded(game)
    }

    /// Clear all recorded history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameKind;

    fn sample_reaction_json() -> &'static str {
        r#"{
            "gameType": "Reaction Test",
            "raw_events": [
                {"trial": 0, "latency_ms": 300},
                {"trial": 1, "latency_ms": 250},
                {"trial": 2, "latency_ms": 900}
            ],
            "false_starts": 1
        }"#
    }

    fn sample_incomplete_memory_json() -> &'static str {
        r#"{
            "gameType": "Memory Test",
            "sequence": ["red", "green", "blue", "yellow"],
            "user_seq": ["red"]
        }"#
    }

    #[test]
    fn test_score_session_stateless() {
        let result = score_session_json(sample_reaction_json());

        assert!(result.is_ok());
        let outcome: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();

        assert_eq!(outcome["status"], "ready");
        // [300, 250, 900] clamps to [300, 250, 800], trims to 275, halves
        assert_eq!(outcome["metrics"]["reaction_avg"], 138);
        assert_eq!(outcome["metrics"]["memory_score"], serde_json::Value::Null);
        assert_eq!(outcome["metrics"]["duration_ms"], 1450);
        assert_eq!(outcome["metrics"]["false_starts"], 1);
    }

    #[test]
    fn test_score_session_reports_not_ready() {
        let result = score_session_json(sample_incomplete_memory_json()).unwrap();
        let outcome: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(outcome["status"], "not_ready");
        assert_eq!(outcome["reason"]["kind"], "incomplete_response");
        assert_eq!(outcome["reason"]["expected"], 4);
        assert_eq!(outcome["reason"]["actual"], 1);
    }

    #[test]
    fn test_recommendations_stateless() {
        let result =
            recommendations_json(r#"{"stress_level": "high", "cognitive_score": 85}"#).unwrap();
        let list: Vec<String> = serde_json::from_str(&result).unwrap();

        assert_eq!(list.len(), 5);
        assert!(list[0].starts_with("You seem mentally fatigued"));
    }

    #[test]
    fn test_recommendations_empty_for_unresolved() {
        let result =
            recommendations_json(r#"{"stress_level": "unknown", "cognitive_score": null}"#)
                .unwrap();
        assert_eq!(result, "[]");
    }

    #[test]
    fn test_invalid_json() {
        assert!(score_session_json("not valid json").is_err());
        assert!(recommendations_json("not valid json").is_err());
    }

    #[test]
    fn test_unknown_game_type() {
        let result = score_session_json(r#"{"gameType": "Chess", "raw_events": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_processor_accumulates_history() {
        let mut processor = SessionProcessor::new();

        processor.process(sample_reaction_json()).unwrap();
        processor.process(sample_reaction_json()).unwrap();

        assert_eq!(processor.history_session_count(GameKind::ReactionTest), 2);
        assert_eq!(processor.history_session_count(GameKind::StroopTest), 0);
    }

    #[test]
    fn test_processor_skips_not_ready_sessions() {
        let mut processor = SessionProcessor::new();
        processor.process(sample_incomplete_memory_json()).unwrap();
        assert_eq!(processor.history_session_count(GameKind::MemoryTest), 0);
    }

    #[test]
    fn test_processor_history_window() {
        let mut processor = SessionProcessor::with_history_window(3);
        for _ in 0..5 {
            processor.process(sample_reaction_json()).unwrap();
        }
        assert_eq!(processor.history_session_count(GameKind::ReactionTest), 3);
    }

    #[test]
    fn test_processor_backfills_predict_requests() {
        let mut processor = SessionProcessor::new();
        processor.process(sample_reaction_json()).unwrap();

        // A memory-only session has no reaction_avg; the window supplies one
        let metrics = SessionMetrics {
            reaction_avg: None,
            memory_score: Some(67),
            duration_ms: 1200,
            false_starts: None,
        };
        let request = processor.predict_request_for(&metrics);
        assert_eq!(request.reaction_avg, Some(138));
        assert_eq!(request.memory_score, Some(67));
    }

    #[test]
    fn test_history_serialization() {
        let mut processor = SessionProcessor::new();
        processor.process(sample_reaction_json()).unwrap();

        let saved = processor.save_history().unwrap();

        let mut restored = SessionProcessor::new();
        restored.load_history(&saved).unwrap();
        assert_eq!(restored.history_session_count(GameKind::ReactionTest), 1);
    }

    #[test]
    fn test_clear_history() {
        let mut processor = SessionProcessor::new();
        processor.process(sample_reaction_json()).unwrap();
        processor.clear_history();
        assert_eq!(processor.history_session_count(GameKind::ReactionTest), 0);
    }

    #[test]
    fn test_processor_recommendation_policy() {
        let processor = SessionProcessor::new();
        let classification = ClassificationResult {
            stress_level: crate::types::StressLevel::Low,
            cognitive_score: Some(85.0),
            recommendations: Vec::new(),
        };
        // Deterministic default concatenates both strong-performance pools
        assert_eq!(processor.recommend(&classification).len(), 8);

        let sampled = SessionProcessor::new().with_policy(SelectionPolicy::sample_two());
        let picks = sampled.recommend(&classification);
        assert_eq!(picks.len(), 2);
    }
}
