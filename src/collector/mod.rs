//! Bounded top-K collection of field-sorted hits.
//!
//! [`TopFieldCollector`] maintains the K best hits of an unbounded
//! candidate stream. Within a segment the driving matcher may deliver
//! documents in any order; the collector screens each candidate against
//! the weakest admitted slot through the comparator chain, copies
//! competitive hits over the evicted slot, and re-establishes the new
//! weakest slot: O(log K) per admission, one `compare_bottom` per
//! rejection.

pub mod merger;

mod queue;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XiphosError};
use crate::scoring::Scorer;
use crate::segment::SegmentContext;
use crate::sort::{ComparatorChain, SortCriterion, SortField, SortValue};

use self::queue::{FieldValueHitQueue, QueueEntry};

/// One ranked hit with its reported sort keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHit {
    /// Collection-wide document id.
    pub doc: u64,
    /// Relevance score, when the sort includes the relevance criterion;
    /// zero otherwise.
    pub score: f32,
    /// The hit's sort key under each criterion, in chain order. Feed these
    /// back through [`TopFieldCollector::with_search_after`] to resume the
    /// scan behind this hit.
    pub sort_values: Vec<SortValue>,
}

/// The ranked result of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResults {
    /// The top hits, best first.
    pub hits: Vec<FieldHit>,
    /// Total number of candidates seen, admitted or not.
    pub total_hits: u64,
}

/// A bounded collector of the top K hits under a sort specification.
///
/// Driving protocol, per segment: [`set_next_segment`], then
/// [`set_scorer`] when [`needs_scores`] says so, then [`collect`] for
/// every candidate. [`into_results`] drains the queue into final order.
///
/// [`set_next_segment`]: TopFieldCollector::set_next_segment
/// [`set_scorer`]: TopFieldCollector::set_scorer
/// [`needs_scores`]: TopFieldCollector::needs_scores
/// [`collect`]: TopFieldCollector::collect
/// [`into_results`]: TopFieldCollector::into_results
#[derive(Debug)]
pub struct TopFieldCollector {
    chain: ComparatorChain,
    queue: FieldValueHitQueue,
    total_hits: u64,
    doc_base: u64,
    in_segment: bool,
    /// Doc id of the search-after boundary hit; `Some` puts the collector
    /// in deep-paging mode.
    after_doc: Option<u64>,
}

impl TopFieldCollector {
    /// Create a collector for the top `k` hits under `spec`.
    pub fn new(spec: &[SortField], k: usize) -> Result<Self> {
        Ok(TopFieldCollector {
            chain: ComparatorChain::for_spec(spec, k)?,
            queue: FieldValueHitQueue::new(k),
            total_hits: 0,
            doc_base: 0,
            in_segment: false,
            after_doc: None,
        })
    }

    /// Create a collector that resumes behind a previously returned hit.
    ///
    /// Candidates that sort at or before the boundary (including an exact
    /// tie on every criterion and on the doc id) are counted but never
    /// admitted.
    pub fn with_search_after(spec: &[SortField], k: usize, after: &FieldHit) -> Result<Self> {
        let mut collector = Self::new(spec, k)?;
        collector.chain.set_top_values(&after.sort_values)?;
        collector.after_doc = Some(after.doc);
        Ok(collector)
    }

    /// Check whether the sort needs a scorer wired in per segment.
    pub fn needs_scores(&self) -> bool {
        self.chain.needs_scores()
    }

    /// Switch to the next segment.
    pub fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()> {
        self.chain.set_next_segment(ctx)?;
        self.doc_base = ctx.doc_base;
        self.in_segment = true;
        Ok(())
    }

    /// Wire in the scorer for the current segment.
    pub fn set_scorer(&mut self, scorer: Box<dyn Scorer>) -> Result<()> {
        self.chain.set_scorer(scorer)
    }

    /// Offer a candidate document of the current segment.
    pub fn collect(&mut self, doc: u32) -> Result<()> {
        if !self.in_segment {
            return Err(XiphosError::invalid_operation(
                "collect called before set_next_segment",
            ));
        }
        let global_doc = self.doc_base + doc as u64;
        self.total_hits += 1;

        if let Some(after_doc) = self.after_doc {
            // Deep paging: only documents strictly after the boundary
            // qualify; ties on every criterion fall back to the doc id.
            let boundary = self.chain.compare_top(doc)?;
            let qualified = match boundary {
                Ordering::Less => true,
                Ordering::Equal => global_doc > after_doc,
                Ordering::Greater => false,
            };
            if !qualified {
                return Ok(());
            }
        }

        if !self.queue.is_full() {
            // Fill phase: every qualifying candidate gets a fresh slot.
            let slot = self.queue.len();
            self.chain.copy(slot, doc)?;
            self.queue.push(
                QueueEntry {
                    slot,
                    doc: global_doc,
                },
                &self.chain,
            );
            if self.queue.is_full() {
                let worst = self.queue.worst().expect("queue is full").slot;
                self.chain.set_bottom(worst);
            }
            return Ok(());
        }

        let bottom = self.chain.compare_bottom(doc)?;
        let worst_doc = self.queue.worst().expect("queue is full").doc;
        let competitive = match bottom {
            Ordering::Greater => true,
            Ordering::Equal => global_doc < worst_doc,
            Ordering::Less => false,
        };
        if !competitive {
            return Ok(());
        }

        // Overwrite the evicted slot in place and restore the heap.
        let slot = self.queue.worst().expect("queue is full").slot;
        self.chain.copy(slot, doc)?;
        self.queue.update_worst(global_doc, &self.chain);
        let worst = self.queue.worst().expect("queue is full").slot;
        self.chain.set_bottom(worst);
        Ok(())
    }

    /// Get the total number of candidates seen so far.
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    /// Check if the queue still has room.
    pub fn needs_more(&self) -> bool {
        !self.queue.is_full()
    }

    /// Drain the queue into the final ranked results.
    pub fn into_results(self) -> FieldResults {
        let TopFieldCollector {
            chain,
            queue,
            total_hits,
            ..
        } = self;

        let score_index = chain
            .fields()
            .iter()
            .position(|f| matches!(f.criterion, SortCriterion::Score));

        let hits = queue
            .drain_sorted(&chain)
            .into_iter()
            .map(|entry| {
                let sort_values = chain.values(entry.slot);
                let score = match score_index.map(|i| &sort_values[i]) {
                    Some(SortValue::F32(score)) => *score,
                    _ => 0.0,
                };
                FieldHit {
                    doc: entry.doc,
                    score,
                    sort_values,
                }
            })
            .collect();

        FieldResults { hits, total_hits }
    }
}
