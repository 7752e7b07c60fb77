//! Document-id comparator.

use std::cmp::Ordering;

use crate::error::{Result, XiphosError};
use crate::segment::SegmentContext;
use crate::sort::SortValue;
use crate::sort::comparator::FieldComparator;

/// Comparator ranking hits by ascending collection-wide document id.
///
/// Every comparison is pure integer arithmetic over `doc_base + local_doc`
/// with no storage access, which makes this the cheapest possible
/// tie-break; it is typically placed last in a chain.
#[derive(Debug)]
pub struct DocIdComparator {
    /// Cached collection-wide id per slot.
    doc_ids: Vec<u64>,
    /// docBase of the current segment.
    doc_base: u64,
    /// Id of the weakest admitted slot.
    bottom: u64,
    /// Deep-paging boundary id.
    top: Option<u64>,
}

impl DocIdComparator {
    /// Create a comparator sized to `k` slots.
    pub fn new(k: usize) -> Self {
        DocIdComparator {
            doc_ids: vec![0; k],
            doc_base: 0,
            bottom: 0,
            top: None,
        }
    }
}

impl FieldComparator for DocIdComparator {
    fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering {
        self.doc_ids[slot_a].cmp(&self.doc_ids[slot_b])
    }

    fn set_bottom(&mut self, slot: usize) {
        self.bottom = self.doc_ids[slot];
    }

    fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        Ok(self.bottom.cmp(&(self.doc_base + doc as u64)))
    }

    fn set_top_value(&mut self, value: &SortValue) -> Result<()> {
        match value {
            SortValue::U64(doc_id) => {
                self.top = Some(*doc_id);
                Ok(())
            }
            other => Err(XiphosError::sort(format!(
                "boundary value {:?} is not a document id",
                other
            ))),
        }
    }

    fn compare_top(&mut self, doc: u32) -> Result<Ordering> {
        let top = self.top.ok_or_else(|| {
            XiphosError::invalid_operation("compare_top called before set_top_value")
        })?;
        Ok(top.cmp(&(self.doc_base + doc as u64)))
    }

    fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        self.doc_ids[slot] = self.doc_base + doc as u64;
        Ok(())
    }

    fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()> {
        self.doc_base = ctx.doc_base;
        Ok(())
    }

    fn value(&self, slot: usize) -> SortValue {
        SortValue::U64(self.doc_ids[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_values::memory::MemorySegmentBuilder;
    use std::sync::Arc;

    #[test]
    fn test_cross_segment_ids() {
        let first = SegmentContext::new(0, 4, Arc::new(MemorySegmentBuilder::new(4).build()));
        let second = SegmentContext::new(4, 4, Arc::new(MemorySegmentBuilder::new(4).build()));

        let mut comparator = DocIdComparator::new(2);
        comparator.set_next_segment(&first).unwrap();
        comparator.copy(0, 3).unwrap(); // global 3
        comparator.set_next_segment(&second).unwrap();
        comparator.copy(1, 0).unwrap(); // global 4

        assert_eq!(comparator.compare(0, 1), Ordering::Less);
        assert_eq!(comparator.value(1), SortValue::U64(4));

        comparator.set_bottom(1);
        assert_eq!(comparator.compare_bottom(2).unwrap(), Ordering::Less); // global 6
        assert_eq!(comparator.compare_bottom(0).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_top_boundary() {
        let ctx = SegmentContext::new(10, 4, Arc::new(MemorySegmentBuilder::new(4).build()));
        let mut comparator = DocIdComparator::new(1);
        comparator.set_top_value(&SortValue::U64(11)).unwrap();
        comparator.set_next_segment(&ctx).unwrap();

        assert_eq!(comparator.compare_top(0).unwrap(), Ordering::Greater);
        assert_eq!(comparator.compare_top(1).unwrap(), Ordering::Equal);
        assert_eq!(comparator.compare_top(3).unwrap(), Ordering::Less);
    }
}
