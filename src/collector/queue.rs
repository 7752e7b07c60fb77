//! Bounded slot heap ordered by the comparator chain.
//!
//! The queue holds at most K entries, each naming a slot in the
//! comparators' value arrays plus the hit's collection-wide doc id. The
//! *worst* entry under the chain's composite order sits at the root, so
//! eviction is O(1) and admission is O(log K). Slot values live in the
//! comparators; the heap only re-orders entries, comparing through the
//! chain with ascending doc id as the final tie-break.

use crate::sort::ComparatorChain;

/// One admitted hit: its slot and its collection-wide doc id.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueEntry {
    pub(crate) slot: usize,
    pub(crate) doc: u64,
}

/// Bounded priority queue with the weakest entry at the root.
#[derive(Debug)]
pub(crate) struct FieldValueHitQueue {
    heap: Vec<QueueEntry>,
    capacity: usize,
}

impl FieldValueHitQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        FieldValueHitQueue {
            heap: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// The weakest admitted entry, once the queue is non-empty.
    pub(crate) fn worst(&self) -> Option<&QueueEntry> {
        self.heap.first()
    }

    /// `true` when `a` sorts after `b` in the final order.
    fn sorts_after(chain: &ComparatorChain, a: &QueueEntry, b: &QueueEntry) -> bool {
        match chain.compare(a.slot, b.slot) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => a.doc > b.doc,
        }
    }

    /// Add an entry. Must not be called on a full queue.
    pub(crate) fn push(&mut self, entry: QueueEntry, chain: &ComparatorChain) {
        debug_assert!(!self.is_full());
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1, chain);
    }

    /// Re-establish heap order after the root's slot was overwritten with
    /// a new hit.
    pub(crate) fn update_worst(&mut self, doc: u64, chain: &ComparatorChain) {
        debug_assert!(!self.heap.is_empty());
        self.heap[0].doc = doc;
        self.sift_down(0, chain);
    }

    /// Remove and return all entries, best first.
    pub(crate) fn drain_sorted(mut self, chain: &ComparatorChain) -> Vec<QueueEntry> {
        let mut entries = Vec::with_capacity(self.heap.len());
        while let Some(entry) = self.pop_worst(chain) {
            entries.push(entry);
        }
        entries.reverse();
        entries
    }

    fn pop_worst(&mut self, chain: &ComparatorChain) -> Option<QueueEntry> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let worst = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0, chain);
        }
        worst
    }

    fn sift_up(&mut self, mut index: usize, chain: &ComparatorChain) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if Self::sorts_after(chain, &self.heap[index], &self.heap[parent]) {
                self.heap.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize, chain: &ComparatorChain) {
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;
            if left < self.heap.len()
                && Self::sorts_after(chain, &self.heap[left], &self.heap[largest])
            {
                largest = left;
            }
            if right < self.heap.len()
                && Self::sorts_after(chain, &self.heap[right], &self.heap[largest])
            {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.heap.swap(index, largest);
            index = largest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_values::memory::MemorySegmentBuilder;
    use crate::segment::SegmentContext;
    use crate::sort::SortField;
    use std::sync::Arc;

    fn chain_with_values(values: &[i64]) -> ComparatorChain {
        let mut builder = MemorySegmentBuilder::new(values.len() as u32);
        for (doc, value) in values.iter().enumerate() {
            builder.set_i64("n", doc as u32, *value).unwrap();
        }
        let ctx = SegmentContext::new(0, values.len() as u32, Arc::new(builder.build()));
        let mut chain =
            ComparatorChain::for_spec(&[SortField::i64_field("n")], values.len()).unwrap();
        chain.set_next_segment(&ctx).unwrap();
        for slot in 0..values.len() {
            chain.copy(slot, slot as u32).unwrap();
        }
        chain
    }

    #[test]
    fn test_worst_at_root() {
        let chain = chain_with_values(&[5, 1, 9, 3]);
        let mut queue = FieldValueHitQueue::new(4);
        for slot in 0..4 {
            queue.push(
                QueueEntry {
                    slot,
                    doc: slot as u64,
                },
                &chain,
            );
        }

        assert!(queue.is_full());
        // Ascending sort: 9 is the weakest value.
        assert_eq!(queue.worst().unwrap().slot, 2);
    }

    #[test]
    fn test_drain_best_first() {
        let chain = chain_with_values(&[5, 1, 9, 3]);
        let mut queue = FieldValueHitQueue::new(4);
        for slot in 0..4 {
            queue.push(
                QueueEntry {
                    slot,
                    doc: slot as u64,
                },
                &chain,
            );
        }

        let slots: Vec<usize> = queue.drain_sorted(&chain).iter().map(|e| e.slot).collect();
        assert_eq!(slots, vec![1, 3, 0, 2]); // values 1, 3, 5, 9
    }

    #[test]
    fn test_doc_id_tie_break() {
        let chain = chain_with_values(&[7, 7, 7]);
        let mut queue = FieldValueHitQueue::new(3);
        for slot in 0..3 {
            queue.push(
                QueueEntry {
                    slot,
                    doc: 100 - slot as u64,
                },
                &chain,
            );
        }

        // Equal values: the largest doc id is the weakest.
        assert_eq!(queue.worst().unwrap().doc, 100);
        let docs: Vec<u64> = queue.drain_sorted(&chain).iter().map(|e| e.doc).collect();
        assert_eq!(docs, vec![98, 99, 100]);
    }
}
