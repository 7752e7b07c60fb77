//! The comparator contract driven by the top-K collector.
//!
//! A comparator owns one cached sort-key value per queue slot and answers
//! slot-to-slot and slot-to-candidate comparisons. The collector enrolls a
//! competitive hit into a slot with [`FieldComparator::copy`], keeps the
//! weakest admitted slot published through [`FieldComparator::set_bottom`],
//! and screens every further candidate with
//! [`FieldComparator::compare_bottom`], by far the hottest call during a
//! scan. Segment transitions arrive through
//! [`FieldComparator::set_next_segment`], after which the comparator must
//! not compare any document until its segment-scoped state is refreshed.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::Result;
use crate::scoring::Scorer;
use crate::segment::SegmentContext;
use crate::sort::SortValue;

/// A stateful per-slot comparator for one sort criterion.
///
/// All orderings reported by a comparator are the criterion's natural
/// order; direction reversal is applied by the owning
/// [`ComparatorChain`](crate::sort::chain::ComparatorChain).
pub trait FieldComparator: Send + Debug {
    /// Compare the hit in `slot_a` with the hit in `slot_b`.
    ///
    /// Both slots must have been filled by a prior
    /// [`copy`](FieldComparator::copy).
    fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering;

    /// Record the weakest admitted slot. Subsequent
    /// [`compare_bottom`](FieldComparator::compare_bottom) calls compare
    /// candidates against this slot.
    ///
    /// For a secondary comparator in a chain the slot may not hold the
    /// weakest value under this criterion alone; it is the weakest under
    /// the composite order.
    fn set_bottom(&mut self, slot: usize);

    /// Compare the bottom slot against a candidate document of the current
    /// segment, as if the candidate had been copied into a fresh slot and
    /// compared with [`compare`](FieldComparator::compare).
    fn compare_bottom(&mut self, doc: u32) -> Result<Ordering>;

    /// Record the deep-paging boundary value. Called once, before the first
    /// segment, for searches that resume after a previous page.
    fn set_top_value(&mut self, value: &SortValue) -> Result<()>;

    /// Compare the recorded boundary value against a candidate document of
    /// the current segment. Only called after
    /// [`set_top_value`](FieldComparator::set_top_value).
    fn compare_top(&mut self, doc: u32) -> Result<Ordering>;

    /// Copy a candidate document's sort key into a slot.
    fn copy(&mut self, slot: usize, doc: u32) -> Result<()>;

    /// Switch to a new segment, refreshing any segment-scoped accessor
    /// handles and recomputing cached bounds before any document of the
    /// new segment is compared.
    fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()>;

    /// Wire in the scorer for the current segment. A no-op for comparators
    /// that do not sort by score.
    fn set_scorer(&mut self, scorer: Box<dyn Scorer>) -> Result<()> {
        let _ = scorer;
        Ok(())
    }

    /// Return the sort value cached in a slot, for reporting the sort keys
    /// of the final hits.
    fn value(&self, slot: usize) -> SortValue;
}
