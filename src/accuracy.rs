//! Accuracy scoring for memory-family games
//!
//! Sequence memory, pattern memory, and the dual task's reproduction phase all
//! score the same way: positional equality between a target and the user's
//! response, as a 0-100 percentage. The comparison is generic over the symbol
//! type (color names, digits, grid booleans).

/// Integer accuracy percentage: `round(correct / total * 100)`.
///
/// `None` when `total` is zero; a score over nothing is meaningless.
pub fn percentage(correct: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    Some((correct as f64 / total as f64 * 100.0).round() as u8)
}

/// A target sequence paired with the user's reproduction.
///
/// Scoring is only accepted once the response length equals the target length;
/// anything shorter (or longer) is "not yet ready", never an error.
#[derive(Debug, Clone, Copy)]
pub struct SequenceComparison<'a, T> {
    target: &'a [T],
    response: &'a [T],
}

impl<'a, T: PartialEq> SequenceComparison<'a, T> {
    pub fn new(target: &'a [T], response: &'a [T]) -> Self {
        Self { target, response }
    }

    /// Length the response must reach before scoring
    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    /// Current response length
    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Whether the comparison can be scored.
    ///
    /// An empty target is never complete; capture always presents at least one
    /// symbol.
    pub fn is_complete(&self) -> bool {
        !self.target.is_empty() && self.target.len() == self.response.len()
    }

    /// Positions where the response equals the target at the same index
    pub fn correct_count(&self) -> usize {
        self.target
            .iter()
            .zip(self.response.iter())
            .filter(|(t, r)| t == r)
            .count()
    }

    /// `round(correct_count / target_len * 100)`, or `None` while incomplete
    pub fn score(&self) -> Option<u8> {
        if !self.is_complete() {
            return None;
        }
        percentage(self.correct_count(), self.target.len())
    }
}
