//! Scoring collaborators for relevance sorting.
//!
//! The relevance comparator does not compute scores itself; it is handed a
//! [`Scorer`] positioned on the current segment and wraps it in a
//! [`ScoreCachingScorer`] so that repeated comparisons against the same
//! document score it once.

use std::fmt::Debug;

use crate::error::Result;

/// Trait for per-document scorers over the current segment.
///
/// Document ids are segment-local. Scores must be finite; a NaN score is a
/// programmer error in the scoring collaborator.
pub trait Scorer: Send + Debug {
    /// Calculate the score for a document.
    fn score(&mut self, doc: u32) -> Result<f32>;
}

/// A scorer wrapper that caches the most recent (doc, score) pair.
///
/// The collector probes a candidate's score once for the competitiveness
/// check and again when copying it into a slot; the cache collapses those
/// into a single computation.
#[derive(Debug)]
pub struct ScoreCachingScorer {
    inner: Box<dyn Scorer>,
    cached: Option<(u32, f32)>,
}

impl ScoreCachingScorer {
    /// Wrap a scorer in a score cache.
    pub fn new(inner: Box<dyn Scorer>) -> Self {
        ScoreCachingScorer {
            inner,
            cached: None,
        }
    }
}

impl Scorer for ScoreCachingScorer {
    fn score(&mut self, doc: u32) -> Result<f32> {
        if let Some((cached_doc, cached_score)) = self.cached
            && cached_doc == doc
        {
            return Ok(cached_score);
        }
        let score = self.inner.score(doc)?;
        self.cached = Some((doc, score));
        Ok(score)
    }
}

/// A scorer backed by a precomputed score per document.
///
/// Documents beyond the table score zero.
#[derive(Debug, Clone)]
pub struct PrecomputedScorer {
    scores: Vec<f32>,
}

impl PrecomputedScorer {
    /// Create a scorer from per-document scores.
    pub fn new(scores: Vec<f32>) -> Self {
        PrecomputedScorer { scores }
    }
}

impl Scorer for PrecomputedScorer {
    fn score(&mut self, doc: u32) -> Result<f32> {
        Ok(self.scores.get(doc as usize).copied().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts how many times each document is actually scored.
    #[derive(Debug)]
    struct CountingScorer {
        calls: usize,
    }

    impl Scorer for CountingScorer {
        fn score(&mut self, doc: u32) -> Result<f32> {
            self.calls += 1;
            Ok(doc as f32 * 0.1)
        }
    }

    #[test]
    fn test_score_caching() {
        let mut scorer = ScoreCachingScorer::new(Box::new(CountingScorer { calls: 0 }));

        assert_eq!(scorer.score(3).unwrap(), 0.3);
        assert_eq!(scorer.score(3).unwrap(), 0.3);
        assert_eq!(scorer.score(5).unwrap(), 0.5);

        let inner_calls = format!("{:?}", scorer);
        // One call for doc 3, one for doc 5.
        assert!(inner_calls.contains("calls: 2"));
    }

    #[test]
    fn test_precomputed_scorer() {
        let mut scorer = PrecomputedScorer::new(vec![0.9, 0.4]);
        assert_eq!(scorer.score(0).unwrap(), 0.9);
        assert_eq!(scorer.score(1).unwrap(), 0.4);
        assert_eq!(scorer.score(9).unwrap(), 0.0);
    }
}
