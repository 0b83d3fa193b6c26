//! Recommendation rule engine
//!
//! Maps a `(stress_level, cognitive_score)` pair onto product recommendation
//! text. Rules are data: an immutable table evaluated in fixed priority order,
//! every matching rule's pool contributing. Selection is deterministic by
//! default; the randomized pick-n behavior survives as a configuration policy.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::StressLevel;

/// Pool shown whenever stress resolves high, regardless of score
pub const HIGH_STRESS_POOL: [&str; 5] = [
    "You seem mentally fatigued - taking a short break may help restore focus.",
    "A brief pause and some deep breathing could improve your next performance.",
    "Reducing distractions and returning later may feel more comfortable.",
    "It's okay to slow down - giving yourself time can improve results.",
    "Stepping away briefly might help you feel more relaxed and focused.",
];

/// Pool shown whenever stress resolves medium, regardless of score
pub const MEDIUM_STRESS_POOL: [&str; 5] = [
    "You're doing fairly well - a short rest could sharpen your focus.",
    "Trying one more round calmly may improve consistency.",
    "Your performance is stable - staying relaxed can help further.",
    "A brief focus exercise may help before continuing.",
    "You're on track - maintaining a steady pace can boost results.",
];

/// Calm half of the strong-performance output (low stress, score >= 70)
pub const LOW_STRESS_POOL: [&str; 5] = [
    "Great work - your focus and control look well balanced.",
    "You're performing consistently - keep up the good rhythm.",
    "Excellent performance - your current state supports strong focus.",
    "You appear relaxed and attentive - well done!",
    "Keep practicing to maintain this positive performance level.",
];

/// Pool for scores below 40
pub const LOW_COGNITIVE_POOL: [&str; 3] = [
    "This task may feel challenging right now - gradual practice can help.",
    "Taking things step by step may improve comfort and accuracy.",
    "It's normal to struggle sometimes - steady practice can make a difference.",
];

/// Pool for scores 40-69
pub const MID_COGNITIVE_POOL: [&str; 3] = [
    "Your cognitive performance is developing well - consistency will help.",
    "You're building focus - continued practice can strengthen it further.",
    "You're progressing - keeping a calm pace may improve accuracy.",
];

/// Sharp half of the strong-performance output (low stress, score >= 70)
pub const HIGH_COGNITIVE_POOL: [&str; 3] = [
    "Your cognitive performance is strong - great job!",
    "You're demonstrating good mental control and focus.",
    "Excellent cognitive performance - keep up the good work.",
];

/// Stress constraint carried by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressMatcher {
    Low,
    Medium,
    High,
    /// Matches every stress level, `unknown` included
    Any,
}

impl StressMatcher {
    pub fn matches(&self, level: StressLevel) -> bool {
        match self {
            StressMatcher::Any => true,
            StressMatcher::Low => level == StressLevel::Low,
            StressMatcher::Medium => level == StressLevel::Medium,
            StressMatcher::High => level == StressLevel::High,
        }
    }
}

/// One rule: a stress constraint, an inclusive score range, and the pool it
/// contributes when matched.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRule {
    pub stress_level: StressMatcher,
    /// Inclusive `[min, max]` bucket bounds
    pub cognitive_score_range: (u8, u8),
    pub pool: &'static [&'static str],
}

impl RecommendationRule {
    fn matches(&self, stress: StressLevel, score_bucket: u8) -> bool {
        let (min, max) = self.cognitive_score_range;
        self.stress_level.matches(stress) && score_bucket >= min && score_bucket <= max
    }
}

/// The rule table, in fixed priority order.
///
/// Stress rules contribute regardless of score; score rules apply at any
/// stress except that the strong-performance pools require resolved low
/// stress. Loaded once, read-only thereafter.
pub const RULE_TABLE: [RecommendationRule; 6] = [
    RecommendationRule {
        stress_level: StressMatcher::High,
        cognitive_score_range: (0, 100),
        pool: &HIGH_STRESS_POOL,
    },
    RecommendationRule {
        stress_level: StressMatcher::Medium,
        cognitive_score_range: (0, 100),
        pool: &MEDIUM_STRESS_POOL,
    },
    RecommendationRule {
        stress_level: StressMatcher::Any,
        cognitive_score_range: (0, 39),
        pool: &LOW_COGNITIVE_POOL,
    },
    RecommendationRule {
        stress_level: StressMatcher::Any,
        cognitive_score_range: (40, 69),
        pool: &MID_COGNITIVE_POOL,
    },
    RecommendationRule {
        stress_level: StressMatcher::Low,
        cognitive_score_range: (70, 100),
        pool: &LOW_STRESS_POOL,
    },
    RecommendationRule {
        stress_level: StressMatcher::Low,
        cognitive_score_range: (70, 100),
        pool: &HIGH_COGNITIVE_POOL,
    },
];

/// How recommendations are picked from the matching pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Concatenate every matching pool in table order (deterministic)
    AllMatching,
    /// Sample `n` entries uniformly without replacement from the matching
    /// pools (the historical product behavior, n = 2)
    SampleN { n: usize },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::AllMatching
    }
}

impl SelectionPolicy {
    /// The historical randomized pick-2
    pub fn sample_two() -> Self {
        SelectionPolicy::SampleN { n: 2 }
    }
}

/// Bucket a possibly-fractional score for inclusive integer range matching.
///
/// Flooring keeps the strict-threshold semantics the product shipped with:
/// 39.9 stays below the 40 boundary.
fn score_bucket(score: f64) -> u8 {
    score.clamp(0.0, 100.0).floor() as u8
}

/// The recommendation rule engine
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    policy: SelectionPolicy,
}

impl RecommendationEngine {
    /// Engine with the deterministic all-matching policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Recommendations for a classified session.
    ///
    /// Total: never panics for any stress level and any score in
    /// `[0, 100] ∪ {None}`. Empty output means the inputs were unresolved
    /// (no score, or an unknown stress at a score no `any` rule covers);
    /// the engine never guesses.
    pub fn recommend(
        &self,
        stress_level: StressLevel,
        cognitive_score: Option<f64>,
    ) -> Vec<String> {
        match self.policy {
            SelectionPolicy::AllMatching => {
                Self::matching_pool(stress_level, cognitive_score)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            }
            SelectionPolicy::SampleN { .. } => {
                self.recommend_with_rng(stress_level, cognitive_score, &mut rand::rng())
            }
        }
    }

    /// Like [`recommend`](Self::recommend) with a caller-supplied RNG, so the
    /// sampled policy stays reproducible under a seeded generator. The
    /// deterministic policy ignores the RNG.
    pub fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        stress_level: StressLevel,
        cognitive_score: Option<f64>,
        rng: &mut R,
    ) -> Vec<String> {
        let candidates = Self::matching_pool(stress_level, cognitive_score);
        match self.policy {
            SelectionPolicy::AllMatching => {
                candidates.into_iter().map(str::to_string).collect()
            }
            SelectionPolicy::SampleN { n } => candidates
                .choose_multiple(rng, n)
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Concatenation of every matching rule's pool, table order, first
    /// occurrence wins.
    fn matching_pool(
        stress_level: StressLevel,
        cognitive_score: Option<f64>,
    ) -> Vec<&'static str> {
        let score = match cognitive_score {
            Some(score) => score,
            None => return Vec::new(),
        };
        let bucket = score_bucket(score);

        let mut out: Vec<&'static str> = Vec::new();
        for rule in &RULE_TABLE {
            if rule.matches(stress_level, bucket) {
                for text in rule.pool {
                    if !out.contains(text) {
                        out.push(text);
                    }
                }
            }
        }
        out
    }
}
