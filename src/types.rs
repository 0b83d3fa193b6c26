//! Core domain types
//!
//! This module defines the game roster, the raw observation payloads handed over
//! by trial capture, and the reduced session metrics that flow to the classifier.

use serde::{Deserialize, Serialize};

/// Observation payload schema identifier
pub const OBSERVATIONS_SCHEMA_VERSION: &str = "playwell.observations.v1";

/// Reduction outcome schema identifier
pub const OUTCOME_SCHEMA_VERSION: &str = "playwell.outcome.v1";

/// The six PlayWell games.
///
/// Serialized forms are the wire names the classifier expects in `gameType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    #[serde(rename = "Reaction Test")]
    ReactionTest,
    #[serde(rename = "Stroop Test")]
    StroopTest,
    #[serde(rename = "Visual Search")]
    VisualSearch,
    #[serde(rename = "Memory Test")]
    MemoryTest,
    #[serde(rename = "Pattern Memory")]
    PatternMemory,
    #[serde(rename = "Dual Task")]
    DualTask,
}

impl GameKind {
    /// Wire name used in submission payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::ReactionTest => "Reaction Test",
            GameKind::StroopTest => "Stroop Test",
            GameKind::VisualSearch => "Visual Search",
            GameKind::MemoryTest => "Memory Test",
            GameKind::PatternMemory => "Pattern Memory",
            GameKind::DualTask => "Dual Task",
        }
    }

    /// Parse a wire name back into a game kind
    pub fn from_wire(name: &str) -> Option<GameKind> {
        match name {
            "Reaction Test" => Some(GameKind::ReactionTest),
            "Stroop Test" => Some(GameKind::StroopTest),
            "Visual Search" => Some(GameKind::VisualSearch),
            "Memory Test" => Some(GameKind::MemoryTest),
            "Pattern Memory" => Some(GameKind::PatternMemory),
            "Dual Task" => Some(GameKind::DualTask),
            _ => None,
        }
    }

    /// All games, in roster order
    pub fn all() -> [GameKind; 6] {
        [
            GameKind::ReactionTest,
            GameKind::StroopTest,
            GameKind::VisualSearch,
            GameKind::MemoryTest,
            GameKind::PatternMemory,
            GameKind::DualTask,
        ]
    }

    /// Whether this game produces a `reaction_avg`
    pub fn is_timed(&self) -> bool {
        !matches!(self, GameKind::MemoryTest | GameKind::PatternMemory)
    }

    /// Whether this game produces a `memory_score`
    pub fn is_scored(&self) -> bool {
        !matches!(self, GameKind::ReactionTest | GameKind::VisualSearch)
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stress classification returned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
    /// Classifier could not resolve a level (also the transport-failure
    /// value). Any label outside the known set parses to this variant.
    #[serde(other)]
    Unknown,
}

impl StressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
            StressLevel::Unknown => "unknown",
        }
    }
}

/// One measured stimulus-to-response latency, tagged with its trial index.
///
/// Created by trial capture, consumed once by the reducer, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrialEvent {
    /// Zero-based trial index within the session
    pub trial: u32,
    /// Raw latency in milliseconds, before clamping or motor compensation
    pub latency_ms: u32,
}

impl RawTrialEvent {
    pub fn new(trial: u32, latency_ms: u32) -> Self {
        Self { trial, latency_ms }
    }
}

/// One Stroop round: the response latency plus whether the chosen color name
/// matched the ink color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StroopRound {
    /// Raw latency in milliseconds
    pub latency_ms: u32,
    /// Whether the answer was correct
    pub correct: bool,
}

pub(crate) fn default_input_mode() -> String {
    "mouse+keyboard".to_string()
}

/// Raw observations for one game session, as handed over by trial capture.
///
/// A tagged union keyed by `gameType` so the reducer and the audit `meta`
/// echoed to the classifier cannot drift apart per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gameType")]
pub enum GameObservations {
    #[serde(rename = "Reaction Test")]
    ReactionTest {
        /// Raw stimulus-to-press latencies
        raw_events: Vec<RawTrialEvent>,
        /// Presses registered before stimulus onset
        #[serde(default)]
        false_starts: u32,
        /// Input modality reported by the capture layer
        #[serde(default = "default_input_mode")]
        input: String,
    },
    #[serde(rename = "Stroop Test")]
    StroopTest {
        /// Per-round latency and correctness
        rounds: Vec<StroopRound>,
        #[serde(default)]
        false_starts: u32,
    },
    #[serde(rename = "Visual Search")]
    VisualSearch {
        /// Raw target-found latencies, one per search grid
        raw_events: Vec<RawTrialEvent>,
        #[serde(default)]
        false_starts: u32,
    },
    #[serde(rename = "Memory Test")]
    MemoryTest {
        /// Target color sequence shown to the user
        sequence: Vec<String>,
        /// Colors the user reproduced, in order
        user_seq: Vec<String>,
        /// Per-input latencies, when capture measured them (telemetry only)
        #[serde(default)]
        input_latencies_ms: Vec<u32>,
    },
    #[serde(rename = "Pattern Memory")]
    PatternMemory {
        /// Target grid, row-major booleans (true = lit cell)
        grid: Vec<bool>,
        /// Cells the user toggled on, same length and order
        user_grid: Vec<bool>,
        #[serde(default)]
        input_latencies_ms: Vec<u32>,
    },
    #[serde(rename = "Dual Task")]
    DualTask {
        /// Raw number-press latencies (before the motor floor is applied)
        raw_events: Vec<RawTrialEvent>,
        /// Digit sequence shown during the trials
        memory_sequence: Vec<u8>,
        /// Digits the user reproduced after the trials
        user_memory_input: Vec<u8>,
        #[serde(default)]
        false_starts: u32,
    },
}

impl GameObservations {
    /// The game these observations belong to
    pub fn game(&self) -> GameKind {
        match self {
            GameObservations::ReactionTest { .. } => GameKind::ReactionTest,
            GameObservations::StroopTest { .. } => GameKind::StroopTest,
            GameObservations::VisualSearch { .. } => GameKind::VisualSearch,
            GameObservations::MemoryTest { .. } => GameKind::MemoryTest,
            GameObservations::PatternMemory { .. } => GameKind::PatternMemory,
            GameObservations::DualTask { .. } => GameKind::DualTask,
        }
    }
}

/// Reduced output of one trial session.
///
/// `reaction_avg` is present only for timed games, `memory_score` only for
/// accuracy-scored games; the Stroop Test and the Dual Task carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Trimmed, normalized, divisor-adjusted average reaction time in ms
    pub reaction_avg: Option<u32>,
    /// Accuracy percentage, 0-100
    pub memory_score: Option<u8>,
    /// Sum of raw latencies actually observed; telemetry only
    pub duration_ms: u64,
    /// Premature responses before stimulus onset (timed games only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_starts: Option<u32>,
}

/// Why a session cannot be scored yet.
///
/// Not an error: capture simply has not handed over enough data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotReadyReason {
    /// A timed game recorded no trials
    NoTimedTrials,
    /// A memory-family response is shorter or longer than its target
    IncompleteResponse { expected: usize, actual: usize },
}

/// Result of reducing one session's observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReduceOutcome {
    /// Observations were complete; metrics are ready for submission
    Ready { metrics: SessionMetrics },
    /// Observations are incomplete; no submission should happen yet
    NotReady { reason: NotReadyReason },
}

impl ReduceOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReduceOutcome::Ready { .. })
    }

    pub fn metrics(&self) -> Option<&SessionMetrics> {
        match self {
            ReduceOutcome::Ready { metrics } => Some(metrics),
            ReduceOutcome::NotReady { .. } => None,
        }
    }
}

/// Classification of one submitted session, after wire normalization.
///
/// `recommendations` is empty when the classifier supplied none; callers fall
/// back to the local rule engine in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub stress_level: StressLevel,
    pub cognitive_score: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}
