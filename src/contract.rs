//! Classifier wire contract
//!
//! Request and response shapes for the hosted classifier service, plus the
//! transport seam. The engine builds payloads and interprets responses; it
//! never owns an HTTP client. Embedding apps implement [`SessionTransport`]
//! over whatever networking stack they already carry.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::games::{dual_task, reaction};
use crate::types::{
    ClassificationResult, GameKind, GameObservations, SessionMetrics,
};

/// Route for authenticated session submission (persisted server side)
pub const SUBMIT_PATH: &str = "/game/submit";

/// Route for guest classification (nothing persisted)
pub const PREDICT_PATH: &str = "/game/predict";

/// Authenticated submission payload for `POST /game/submit`.
///
/// Field names follow the wire: `gameType` and `durationMs` are camelCase,
/// the metric fields snake_case. Absent metrics serialize as explicit `null`
/// so the service applies its own history backfill instead of treating the
/// field as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "gameType")]
    pub game_type: GameKind,
    pub reaction_avg: Option<u32>,
    pub memory_score: Option<u8>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub meta: GameMeta,
}

impl SubmitRequest {
    /// Build a submission from reduced metrics plus the observation audit
    /// trail. The game kind is taken from the observations.
    pub fn new(metrics: &SessionMetrics, observations: &GameObservations) -> Self {
        Self {
            game_type: observations.game(),
            reaction_avg: metrics.reaction_avg,
            memory_score: metrics.memory_score,
            duration_ms: metrics.duration_ms,
            meta: GameMeta::from_observations(observations),
        }
    }

    /// Check metric presence against the game's profile before sending.
    ///
    /// A timed game must carry `reaction_avg`, a scored game `memory_score`,
    /// and neither may appear for a game that does not produce it.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.game_type.is_timed() && self.reaction_avg.is_none() {
            return Err(EngineError::MissingField("reaction_avg".to_string()));
        }
        if !self.game_type.is_timed() && self.reaction_avg.is_some() {
            return Err(EngineError::InvalidObservations(format!(
                "{} does not produce reaction_avg",
                self.game_type
            )));
        }
        if self.game_type.is_scored() && self.memory_score.is_none() {
            return Err(EngineError::MissingField("memory_score".to_string()));
        }
        if !self.game_type.is_scored() && self.memory_score.is_some() {
            return Err(EngineError::InvalidObservations(format!(
                "{} does not produce memory_score",
                self.game_type
            )));
        }
        Ok(())
    }
}

/// Guest classification payload for `POST /game/predict`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub reaction_avg: Option<u32>,
    pub memory_score: Option<u8>,
}

impl PredictRequest {
    pub fn from_metrics(metrics: &SessionMetrics) -> Self {
        Self {
            reaction_avg: metrics.reaction_avg,
            memory_score: metrics.memory_score,
        }
    }
}

/// Per-game audit payload carried under `meta` in a submission.
///
/// Shapes and field names mirror what each game has always posted, so stored
/// sessions stay comparable across client versions. The union is untagged on
/// the wire and variants are distinguished by field set, widest first, since
/// `VisualSearch`'s single field is a subset of two others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameMeta {
    Reaction {
        /// Latencies as measured, before any adjustment
        raw_events: Vec<u32>,
        /// The same latencies after motor compensation and clamping
        normalized_events: Vec<u32>,
        #[serde(rename = "falseStarts")]
        false_starts: u32,
        input: String,
    },
    DualTask {
        /// Motor-compensated latencies (floored, not clamped)
        #[serde(rename = "reactionTimes")]
        reaction_times: Vec<u32>,
        #[serde(rename = "memorySequence")]
        memory_sequence: Vec<u8>,
        #[serde(rename = "userMemoryInput")]
        user_memory_input: Vec<u8>,
        #[serde(rename = "motorLatencyBuffer")]
        motor_latency_buffer: u32,
    },
    Stroop {
        /// Raw round latencies
        #[serde(rename = "reactionTimes")]
        reaction_times: Vec<u32>,
        #[serde(rename = "correctCount")]
        correct_count: u32,
        rounds: u32,
    },
    Memory {
        sequence: Vec<String>,
        #[serde(rename = "userSeq")]
        user_seq: Vec<String>,
    },
    Pattern {
        grid: Vec<bool>,
        #[serde(rename = "userGrid")]
        user_grid: Vec<bool>,
    },
    VisualSearch {
        /// Raw per-round latencies
        #[serde(rename = "reactionTimes")]
        reaction_times: Vec<u32>,
    },
}

impl GameMeta {
    /// Build the audit payload for a set of observations.
    pub fn from_observations(observations: &GameObservations) -> Self {
        match observations {
            GameObservations::ReactionTest {
                raw_events,
                false_starts,
                input,
            } => {
                let profile = reaction::PROFILE;
                GameMeta::Reaction {
                    raw_events: raw_events.iter().map(|e| e.latency_ms).collect(),
                    normalized_events: raw_events
                        .iter()
                        .map(|e| profile.adjust(e.latency_ms))
                        .collect(),
                    false_starts: *false_starts,
                    input: input.clone(),
                }
            }
            GameObservations::StroopTest { rounds, .. } => GameMeta::Stroop {
                reaction_times: rounds.iter().map(|r| r.latency_ms).collect(),
                correct_count: rounds.iter().filter(|r| r.correct).count() as u32,
                rounds: rounds.len() as u32,
            },
            GameObservations::VisualSearch { raw_events, .. } => GameMeta::VisualSearch {
                reaction_times: raw_events.iter().map(|e| e.latency_ms).collect(),
            },
            GameObservations::MemoryTest {
                sequence, user_seq, ..
            } => GameMeta::Memory {
                sequence: sequence.clone(),
                user_seq: user_seq.clone(),
            },
            GameObservations::PatternMemory {
                grid, user_grid, ..
            } => GameMeta::Pattern {
                grid: grid.clone(),
                user_grid: user_grid.clone(),
            },
            GameObservations::DualTask {
                raw_events,
                memory_sequence,
                user_memory_input,
                ..
            } => {
                let profile = dual_task::PROFILE;
                GameMeta::DualTask {
                    reaction_times: raw_events
                        .iter()
                        .map(|e| profile.compensate(e.latency_ms))
                        .collect(),
                    memory_sequence: memory_sequence.clone(),
                    user_memory_input: user_memory_input.clone(),
                    motor_latency_buffer: profile.motor_buffer_ms,
                }
            }
        }
    }
}

/// Response body from either classifier route.
///
/// The service mirrors the score under both `cognitive_score` and the legacy
/// `focus_score`; [`score`](Self::score) applies the first-non-null
/// preference clients have always used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResponse {
    /// Persisted session row id, present on the submit route only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    pub stress_level: crate::types::StressLevel,
    #[serde(default)]
    pub cognitive_score: Option<f64>,
    /// Legacy mirror of `cognitive_score`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_score: Option<f64>,
    #[serde(default)]
    pub recommendations: Option<RecommendationsField>,
}

impl ClassifierResponse {
    /// The cognitive score, preferring `cognitive_score` over the legacy
    /// `focus_score` alias.
    pub fn score(&self) -> Option<f64> {
        self.cognitive_score.or(self.focus_score)
    }

    /// Flatten into a [`ClassificationResult`], normalizing the
    /// recommendations field to a list.
    pub fn into_classification(self) -> ClassificationResult {
        let cognitive_score = self.score();
        let recommendations = match self.recommendations {
            Some(field) => field.into_vec(),
            None => Vec::new(),
        };
        ClassificationResult {
            stress_level: self.stress_level,
            cognitive_score,
            recommendations,
        }
    }
}

/// `recommendations` arrives as either a single string or a list.
///
/// Normalized to a list everywhere past the parse; a lone empty string
/// normalizes to no recommendations rather than a blank entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendationsField {
    Many(Vec<String>),
    One(String),
}

impl RecommendationsField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            RecommendationsField::Many(list) => list,
            RecommendationsField::One(text) => {
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
        }
    }
}

/// Transport seam between the engine and the classifier service.
///
/// Implementations move bytes and map their failures into [`EngineError`];
/// everything above this trait treats any `Err` as an unreachable classifier
/// and degrades to the local fallback outcome.
pub trait SessionTransport {
    /// `POST /game/submit` with an authenticated session
    fn submit(&self, request: &SubmitRequest) -> Result<ClassifierResponse, EngineError>;

    /// `POST /game/predict` as a guest
    fn predict(&self, request: &PredictRequest) -> Result<ClassifierResponse, EngineError>;
}
