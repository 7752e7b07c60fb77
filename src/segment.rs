//! Per-segment context handed to comparators at segment transitions.

use std::fmt::Debug;
use std::sync::Arc;

use crate::doc_values::SegmentDocValues;

/// The (reader, docBase) pair identifying the segment currently being
/// scanned.
///
/// Local document ids are segment-relative; `doc_base + local_doc` forms the
/// collection-wide document id. A context is valid until the next segment
/// transition; comparators must refresh any accessor handles they hold
/// before comparing documents of a new segment.
#[derive(Clone)]
pub struct SegmentContext {
    /// Offset added to local document ids to form collection-wide ids.
    pub doc_base: u64,
    /// Number of documents in the segment.
    pub doc_count: u32,
    /// Per-field value source for the segment.
    pub doc_values: Arc<dyn SegmentDocValues>,
}

impl SegmentContext {
    /// Create a new segment context.
    pub fn new(doc_base: u64, doc_count: u32, doc_values: Arc<dyn SegmentDocValues>) -> Self {
        SegmentContext {
            doc_base,
            doc_count,
            doc_values,
        }
    }

    /// Map a local document id to its collection-wide id.
    pub fn global_doc(&self, doc: u32) -> u64 {
        self.doc_base + doc as u64
    }
}

impl Debug for SegmentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentContext")
            .field("doc_base", &self.doc_base)
            .field("doc_count", &self.doc_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_values::memory::MemorySegmentBuilder;

    #[test]
    fn test_global_doc() {
        let segment = Arc::new(MemorySegmentBuilder::new(8).build());
        let ctx = SegmentContext::new(100, 8, segment);
        assert_eq!(ctx.global_doc(0), 100);
        assert_eq!(ctx.global_doc(7), 107);
    }
}
