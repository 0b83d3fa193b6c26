//! PlayWell Engine - Session scoring and recommendation engine for timed cognitive games
//!
//! The engine turns raw per-trial observations from the six PlayWell games into
//! classifier-ready metrics through a deterministic pipeline: observation
//! capture → per-game reduction → canonical metrics → classification →
//! recommendation selection.
//!
//! ## Modules
//!
//! - **Scoring Pipeline**: Reduce raw game observations into canonical session metrics
//! - **Recommendation Engine**: Map stress and cognitive classifications to coaching copy
//! - **Session Driver**: State machine from first trial to submitted outcome

pub mod accuracy;
pub mod contract;
pub mod error;
pub mod games;
pub mod history;
pub mod pipeline;
pub mod recommend;
pub mod session;
pub mod timing;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::EngineError;
pub use pipeline::{recommendations_json, score_session_json, SessionProcessor};

// Wire contract exports
pub use contract::{ClassifierResponse, PredictRequest, SessionTransport, SubmitRequest};

// Session exports
pub use session::{GameSession, SessionOutcome, SessionPhase, SubmissionMode};

pub use recommend::{RecommendationEngine, SelectionPolicy};
pub use types::{GameKind, GameObservations, ReduceOutcome, SessionMetrics, StressLevel};

/// Engine version stamped into session outcomes
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and diagnostics surfaces
pub const PRODUCER_NAME: &str = "playwell-engine";
