//! Relevance (score) comparator.

use std::cmp::Ordering;

use crate::error::{Result, XiphosError};
use crate::scoring::{ScoreCachingScorer, Scorer};
use crate::segment::SegmentContext;
use crate::sort::SortValue;
use crate::sort::comparator::FieldComparator;

/// Comparator ranking hits by descending relevance score.
///
/// The natural order of this criterion is the reverse of the natural float
/// order: a higher score sorts first. A scorer must be wired in through
/// [`FieldComparator::set_scorer`] before any document is compared; it is
/// wrapped in a [`ScoreCachingScorer`] so the competitiveness probe and the
/// subsequent copy of the same document score it once. Scores must be
/// finite.
#[derive(Debug)]
pub struct RelevanceComparator {
    /// Cached score per slot.
    scores: Vec<f32>,
    /// Score of the weakest admitted slot.
    bottom: f32,
    /// Deep-paging boundary score.
    top: Option<f32>,
    /// Scorer for the current segment.
    scorer: Option<ScoreCachingScorer>,
}

impl RelevanceComparator {
    /// Create a comparator sized to `k` slots.
    pub fn new(k: usize) -> Self {
        RelevanceComparator {
            scores: vec![0.0; k],
            bottom: 0.0,
            top: None,
            scorer: None,
        }
    }

    fn score_for(&mut self, doc: u32) -> Result<f32> {
        let scorer = self.scorer.as_mut().ok_or_else(|| {
            XiphosError::invalid_operation("relevance comparator used before set_scorer")
        })?;
        let score = scorer.score(doc)?;
        debug_assert!(!score.is_nan(), "scorer produced a NaN score");
        Ok(score)
    }
}

impl FieldComparator for RelevanceComparator {
    fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering {
        // Reversed: higher scores sort first.
        self.scores[slot_b].total_cmp(&self.scores[slot_a])
    }

    fn set_bottom(&mut self, slot: usize) {
        self.bottom = self.scores[slot];
    }

    fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        let score = self.score_for(doc)?;
        Ok(score.total_cmp(&self.bottom))
    }

    fn set_top_value(&mut self, value: &SortValue) -> Result<()> {
        match value {
            SortValue::F32(score) => {
                self.top = Some(*score);
                Ok(())
            }
            other => Err(XiphosError::sort(format!(
                "boundary value {:?} is not a relevance score",
                other
            ))),
        }
    }

    fn compare_top(&mut self, doc: u32) -> Result<Ordering> {
        let top = self.top.ok_or_else(|| {
            XiphosError::invalid_operation("compare_top called before set_top_value")
        })?;
        let score = self.score_for(doc)?;
        Ok(score.total_cmp(&top))
    }

    fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        self.scores[slot] = self.score_for(doc)?;
        Ok(())
    }

    fn set_next_segment(&mut self, _ctx: &SegmentContext) -> Result<()> {
        // Scores are segment-independent from this comparator's viewpoint;
        // the collector rewires the scorer itself per segment.
        Ok(())
    }

    fn set_scorer(&mut self, scorer: Box<dyn Scorer>) -> Result<()> {
        self.scorer = Some(ScoreCachingScorer::new(scorer));
        Ok(())
    }

    fn value(&self, slot: usize) -> SortValue {
        SortValue::F32(self.scores[slot])
    }
}
