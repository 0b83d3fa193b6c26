//! Session lifecycle
//!
//! One [`GameSession`] covers a full run of one game: capture, reduction,
//! the single classifier round-trip, and the terminal outcome. The lifecycle
//! is an explicit state machine rather than scattered boolean flags, and the
//! submit transition is one-shot: a duplicate completion trigger returns the
//! cached outcome instead of firing a second network call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::{PredictRequest, SessionTransport, SubmitRequest};
use crate::error::EngineError;
use crate::games;
use crate::recommend::RecommendationEngine;
use crate::types::{
    default_input_mode, GameKind, GameObservations, RawTrialEvent, ReduceOutcome,
    SessionMetrics, StressLevel, StroopRound,
};

/// Single recommendation surfaced when the classifier is unreachable
pub const SUBMIT_FAILED_TEXT: &str = "Submit failed";

/// Lifecycle of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    Idle,
    Capturing,
    AwaitingClassification,
    Complete,
    /// Capture abandoned before completion; nothing was submitted
    Aborted,
}

/// How a finished session reaches the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// Token-backed user: full submission, persisted server side
    Authenticated,
    /// No account: reduced predict request, nothing persisted, and
    /// recommendations always derived locally
    Guest,
}

/// Terminal result of one session, shaped for display and host persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub game: GameKind,
    pub mode: SubmissionMode,
    pub metrics: SessionMetrics,
    pub stress_level: StressLevel,
    pub cognitive_score: Option<f64>,
    pub recommendations: Vec<String>,
    /// Row id assigned by the service, authenticated submissions only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_session_id: Option<i64>,
    /// False when the classifier was unreachable and the session fell back
    /// to the local degraded outcome
    pub classified: bool,
    /// Engine version that produced this outcome
    pub engine_version: String,
    pub submitted_at: DateTime<Utc>,
}

/// State machine driving one game session from capture to outcome.
///
/// The driver owns the observation buffer and a [`RecommendationEngine`] for
/// the fallback path. It does not own a network stack; `submit` borrows a
/// [`SessionTransport`] from the caller.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: Uuid,
    mode: SubmissionMode,
    phase: SessionPhase,
    observations: GameObservations,
    engine: RecommendationEngine,
    started_at: Option<DateTime<Utc>>,
    outcome: Option<SessionOutcome>,
}

impl GameSession {
    /// Idle session with an empty observation buffer for `game`
    pub fn new(game: GameKind, mode: SubmissionMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            phase: SessionPhase::Idle,
            observations: empty_observations(game),
            engine: RecommendationEngine::new(),
            started_at: None,
            outcome: None,
        }
    }

    /// Capturing session seeded with already-collected observations, for
    /// hosts that buffer trials themselves and hand them over at the end.
    pub fn from_observations(observations: GameObservations, mode: SubmissionMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            phase: SessionPhase::Capturing,
            observations,
            engine: RecommendationEngine::new(),
            started_at: Some(Utc::now()),
            outcome: None,
        }
    }

    /// Replace the fallback recommendation policy
    pub fn with_recommendation_engine(mut self, engine: RecommendationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn game(&self) -> GameKind {
        self.observations.game()
    }

    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn observations(&self) -> &GameObservations {
        &self.observations
    }

    /// The cached outcome, once the session has completed
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Idle -> Capturing
    pub fn begin(&mut self) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Idle {
            return Err(EngineError::SessionState(format!(
                "cannot begin from {:?}",
                self.phase
            )));
        }
        self.phase = SessionPhase::Capturing;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record one raw stimulus-to-response latency.
    ///
    /// For the timed games this appends a trial event; for the memory games
    /// it appends an input latency (telemetry only). Stroop rounds carry a
    /// correctness flag and go through [`record_round`](Self::record_round).
    pub fn record_latency(&mut self, latency_ms: u32) -> Result<(), EngineError> {
        self.ensure_capturing()?;
        match &mut self.observations {
            GameObservations::ReactionTest { raw_events, .. }
            | GameObservations::VisualSearch { raw_events, .. }
            | GameObservations::DualTask { raw_events, .. } => {
                let trial = raw_events.len() as u32;
                raw_events.push(RawTrialEvent::new(trial, latency_ms));
                Ok(())
            }
            GameObservations::MemoryTest {
                input_latencies_ms, ..
            }
            | GameObservations::PatternMemory {
                input_latencies_ms, ..
            } => {
                input_latencies_ms.push(latency_ms);
                Ok(())
            }
            GameObservations::StroopTest { .. } => Err(EngineError::SessionState(
                "Stroop rounds require a correctness flag, use record_round".to_string(),
            )),
        }
    }

    /// Record one Stroop round
    pub fn record_round(&mut self, latency_ms: u32, correct: bool) -> Result<(), EngineError> {
        self.ensure_capturing()?;
        match &mut self.observations {
            GameObservations::StroopTest { rounds, .. } => {
                rounds.push(StroopRound {
                    latency_ms,
                    correct,
                });
                Ok(())
            }
            other => Err(EngineError::SessionState(format!(
                "{} does not have Stroop rounds",
                other.game()
            ))),
        }
    }

    /// Count a premature response. Timed games only.
    pub fn record_false_start(&mut self) -> Result<(), EngineError> {
        self.ensure_capturing()?;
        match &mut self.observations {
            GameObservations::ReactionTest { false_starts, .. }
            | GameObservations::StroopTest { false_starts, .. }
            | GameObservations::VisualSearch { false_starts, .. }
            | GameObservations::DualTask { false_starts, .. } => {
                *false_starts += 1;
                Ok(())
            }
            other => Err(EngineError::SessionState(format!(
                "{} does not track false starts",
                other.game()
            ))),
        }
    }

    /// Attach the presented and reproduced symbol sequences (Memory Test)
    pub fn record_sequence_recall(
        &mut self,
        target: Vec<String>,
        response: Vec<String>,
    ) -> Result<(), EngineError> {
        self.ensure_capturing()?;
        match &mut self.observations {
            GameObservations::MemoryTest {
                sequence, user_seq, ..
            } => {
                *sequence = target;
                *user_seq = response;
                Ok(())
            }
            other => Err(EngineError::SessionState(format!(
                "{} does not take a symbol sequence",
                other.game()
            ))),
        }
    }

    /// Attach the presented and reproduced grids (Pattern Memory)
    pub fn record_pattern_recall(
        &mut self,
        target: Vec<bool>,
        response: Vec<bool>,
    ) -> Result<(), EngineError> {
        self.ensure_capturing()?;
        match &mut self.observations {
            GameObservations::PatternMemory {
                grid, user_grid, ..
            } => {
                *grid = target;
                *user_grid = response;
                Ok(())
            }
            other => Err(EngineError::SessionState(format!(
                "{} does not take a pattern grid",
                other.game()
            ))),
        }
    }

    /// Attach the presented and reproduced digit streams (Dual Task)
    pub fn record_digit_recall(
        &mut self,
        target: Vec<u8>,
        response: Vec<u8>,
    ) -> Result<(), EngineError> {
        self.ensure_capturing()?;
        match &mut self.observations {
            GameObservations::DualTask {
                memory_sequence,
                user_memory_input,
                ..
            } => {
                *memory_sequence = target;
                *user_memory_input = response;
                Ok(())
            }
            other => Err(EngineError::SessionState(format!(
                "{} does not take a digit stream",
                other.game()
            ))),
        }
    }

    /// Reduce the captured observations without submitting.
    ///
    /// An incomplete capture reports `NotReady` and the session keeps
    /// capturing; readiness is a status, never an error.
    pub fn finish(&mut self) -> Result<ReduceOutcome, EngineError> {
        self.ensure_capturing()?;
        Ok(games::reduce(&self.observations))
    }

    /// Submit the session to the classifier and settle the outcome.
    ///
    /// One-shot: the first call performs the network round-trip, every later
    /// call returns the cached outcome without touching the transport. A
    /// transport failure settles the session with the degraded fallback
    /// outcome (`unknown` stress, no score, [`SUBMIT_FAILED_TEXT`]) rather
    /// than surfacing an error.
    pub fn submit(
        &mut self,
        transport: &dyn SessionTransport,
    ) -> Result<SessionOutcome, EngineError> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }
        self.ensure_capturing()?;

        let metrics = match games::reduce(&self.observations) {
            ReduceOutcome::Ready { metrics } => metrics,
            ReduceOutcome::NotReady { reason } => {
                return Err(EngineError::SessionState(format!(
                    "session is not ready to submit: {:?}",
                    reason
                )));
            }
        };

        self.phase = SessionPhase::AwaitingClassification;

        let response = match self.mode {
            SubmissionMode::Authenticated => {
                let request = SubmitRequest::new(&metrics, &self.observations);
                request.validate()?;
                transport.submit(&request)
            }
            SubmissionMode::Guest => {
                let request = PredictRequest::from_metrics(&metrics);
                transport.predict(&request)
            }
        };

        let outcome = match response {
            Ok(response) => {
                let server_session_id = response.session_id;
                let classification = response.into_classification();
                let recommendations = match self.mode {
                    // Guest sessions never persist, and their recommendations
                    // always come from the local rule engine
                    SubmissionMode::Guest => self.engine.recommend(
                        classification.stress_level,
                        classification.cognitive_score,
                    ),
                    SubmissionMode::Authenticated => {
                        if classification.recommendations.is_empty() {
                            self.engine.recommend(
                                classification.stress_level,
                                classification.cognitive_score,
                            )
                        } else {
                            classification.recommendations
                        }
                    }
                };
                SessionOutcome {
                    session_id: self.id,
                    game: self.game(),
                    mode: self.mode,
                    metrics,
                    stress_level: classification.stress_level,
                    cognitive_score: classification.cognitive_score,
                    recommendations,
                    server_session_id,
                    classified: true,
                    engine_version: crate::ENGINE_VERSION.to_string(),
                    submitted_at: Utc::now(),
                }
            }
            Err(_) => SessionOutcome {
                session_id: self.id,
                game: self.game(),
                mode: self.mode,
                metrics,
                stress_level: StressLevel::Unknown,
                cognitive_score: None,
                recommendations: vec![SUBMIT_FAILED_TEXT.to_string()],
                server_session_id: None,
                classified: false,
                engine_version: crate::ENGINE_VERSION.to_string(),
                submitted_at: Utc::now(),
            },
        };

        self.phase = SessionPhase::Complete;
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Abandon the session. Nothing is submitted; completed sessions cannot
    /// be aborted. Idempotent on an already-aborted session.
    pub fn abort(&mut self) -> Result<(), EngineError> {
        match self.phase {
            SessionPhase::Complete => Err(EngineError::SessionState(
                "session already complete".to_string(),
            )),
            _ => {
                self.phase = SessionPhase::Aborted;
                Ok(())
            }
        }
    }

    fn ensure_capturing(&self) -> Result<(), EngineError> {
        if self.phase != SessionPhase::Capturing {
            return Err(EngineError::SessionState(format!(
                "expected capturing phase, session is {:?}",
                self.phase
            )));
        }
        Ok(())
    }
}

fn empty_observations(game: GameKind) -> GameObservations {
    match game {
        GameKind::ReactionTest => GameObservations::ReactionTest {
            raw_events: Vec::new(),
            false_starts: 0,
            input: default_input_mode(),
        },
        GameKind::StroopTest => GameObservations::StroopTest {
            rounds: Vec::new(),
            false_starts: 0,
        },
        GameKind::VisualSearch => GameObservations::VisualSearch {
            raw_events: Vec::new(),
            false_starts: 0,
        },
        GameKind::MemoryTest => GameObservations::MemoryTest {
            sequence: Vec::new(),
            user_seq: Vec::new(),
            input_latencies_ms: Vec::new(),
        },
        GameKind::PatternMemory => GameObservations::PatternMemory {
            grid: Vec::new(),
            user_grid: Vec::new(),
            input_latencies_ms: Vec::new(),
        },
        GameKind::DualTask => GameObservations::DualTask {
            raw_events: Vec::new(),
            memory_sequence: Vec::new(),
            user_memory_input: Vec::new(),
            false_starts: 0,
        },
    }
}
