//! Term-ordinal comparator for sorted-term fields.
//!
//! Sorts by a field's lexicographic term order, but does most comparisons
//! on integer ordinals (positions in the segment's sorted term dictionary)
//! because an ordinal comparison is O(1) while a byte comparison is
//! O(length). Ordinals are only meaningful within one segment, so every
//! cached ordinal is tagged with the reader generation it was captured
//! under; when the scan leaves a segment, its ordinals are converted to
//! byte values against the outgoing dictionary, and comparisons that span
//! generations fall back to bytes.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use crate::doc_values::SortedValues;
use crate::error::{Result, XiphosError};
use crate::segment::SegmentContext;
use crate::sort::comparator::FieldComparator;
use crate::sort::{MissingPolicy, SortValue};

/// Cached sort key for one slot.
#[derive(Debug, Clone)]
enum CachedKey {
    /// An ordinal valid for the dictionary of the recorded generation.
    Exact { ord: i64, generation: u64 },
    /// A segment-independent byte value; `None` marks a missing value,
    /// distinct from an empty byte string.
    Resolved(Option<Arc<[u8]>>),
}

/// Deep-paging boundary state, re-resolved once per segment.
#[derive(Debug)]
struct TopState {
    /// The boundary value; `None` when the boundary hit had no value.
    value: Option<Arc<[u8]>>,
    /// The boundary's position in the current segment's dictionary.
    ord: i64,
    /// Whether `ord` is the boundary's exact ordinal. When false the value
    /// is absent from this segment's dictionary and `ord` is the ordinal
    /// of the greatest term below it; no document of the segment can
    /// compare equal to the boundary.
    exact: bool,
}

/// Comparator for a sorted-term field, compared through per-segment
/// ordinals with cross-segment byte fallback.
pub struct TermOrdinalComparator {
    /// Field name.
    field: String,
    /// Placement of documents without a value.
    missing: MissingPolicy,
    /// Sentinel ordinal for missing documents: before all terms (-1) or
    /// after all terms (`i64::MAX`).
    missing_ord: i64,
    /// Cached key per slot.
    keys: Vec<CachedKey>,
    /// Reader generation, incremented on every segment transition.
    generation: u64,
    /// Sorted accessor for the current segment.
    current: Option<Arc<dyn SortedValues>>,
    /// Slot of the weakest admitted entry.
    bottom_slot: Option<usize>,
    /// Ordinal the bottom resolves to in the current segment.
    bottom_ord: i64,
    /// Whether `bottom_ord` is exact. When false it is a conservative
    /// lower bound and `compare_bottom` degrades to a one-directional
    /// inequality test, which is all bottom is ever used for.
    bottom_exact: bool,
    /// Deep-paging boundary, when search-after is active.
    top: Option<TopState>,
}

impl TermOrdinalComparator {
    /// Create a comparator sized to `k` slots.
    pub fn new<S: Into<String>>(field: S, missing: MissingPolicy, k: usize) -> Self {
        let missing_ord = match missing {
            MissingPolicy::First => -1,
            MissingPolicy::Last => i64::MAX,
        };
        TermOrdinalComparator {
            field: field.into(),
            missing,
            missing_ord,
            keys: vec![CachedKey::Resolved(None); k],
            generation: 0,
            current: None,
            bottom_slot: None,
            bottom_ord: 0,
            bottom_exact: false,
            top: None,
        }
    }

    fn sorted(&self) -> Result<&Arc<dyn SortedValues>> {
        self.current.as_ref().ok_or_else(|| {
            XiphosError::invalid_operation(format!(
                "term comparator for '{}' used before a segment was set",
                self.field
            ))
        })
    }

    /// Ordinal of a candidate document in the current segment, with the
    /// missing sentinel substituted.
    fn doc_ord(&self, doc: u32) -> Result<i64> {
        let ord = self.sorted()?.ord(doc);
        Ok(if ord == -1 { self.missing_ord } else { ord })
    }

    /// Byte value of a cached key. An `Exact` key is resolved lazily
    /// against the current dictionary; its generation is guaranteed
    /// current because older ordinals were demoted at segment exit.
    fn key_bytes(&self, key: &CachedKey) -> Option<Arc<[u8]>> {
        match key {
            CachedKey::Resolved(bytes) => bytes.clone(),
            CachedKey::Exact { ord, generation } => {
                debug_assert_eq!(*generation, self.generation);
                if *ord == self.missing_ord {
                    None
                } else {
                    self.current.as_ref().map(|sorted| sorted.lookup_ord(*ord))
                }
            }
        }
    }

    fn compare_byte_values(
        &self,
        a: &Option<Arc<[u8]>>,
        b: &Option<Arc<[u8]>>,
    ) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => match self.missing {
                MissingPolicy::First => Ordering::Less,
                MissingPolicy::Last => Ordering::Greater,
            },
            (Some(_), None) => match self.missing {
                MissingPolicy::First => Ordering::Greater,
                MissingPolicy::Last => Ordering::Less,
            },
            (Some(a), Some(b)) => a.cmp(b),
        }
    }

    /// Resolve the deep-paging boundary against the current dictionary.
    fn resolve_top(&mut self) {
        let Some(sorted) = &self.current else {
            return;
        };
        if let Some(top) = &mut self.top {
            match &top.value {
                None => {
                    top.ord = self.missing_ord;
                    top.exact = true;
                }
                Some(bytes) => {
                    let ord = sorted.lookup_term(bytes);
                    if ord >= 0 {
                        top.ord = ord;
                        top.exact = true;
                    } else {
                        top.ord = -ord - 2;
                        top.exact = false;
                    }
                }
            }
        }
    }
}

impl Debug for TermOrdinalComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermOrdinalComparator")
            .field("field", &self.field)
            .field("missing", &self.missing)
            .field("slots", &self.keys.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl FieldComparator for TermOrdinalComparator {
    fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering {
        match (&self.keys[slot_a], &self.keys[slot_b]) {
            // Ordinals are directly comparable only under the same
            // generation's dictionary.
            (
                CachedKey::Exact {
                    ord: ord_a,
                    generation: gen_a,
                },
                CachedKey::Exact {
                    ord: ord_b,
                    generation: gen_b,
                },
            ) if gen_a == gen_b => ord_a.cmp(ord_b),
            (key_a, key_b) => {
                let bytes_a = self.key_bytes(key_a);
                let bytes_b = self.key_bytes(key_b);
                self.compare_byte_values(&bytes_a, &bytes_b)
            }
        }
    }

    fn set_bottom(&mut self, slot: usize) {
        self.bottom_slot = Some(slot);
        match &self.keys[slot] {
            CachedKey::Exact { ord, generation } => {
                // Ordinals from older generations were demoted at segment
                // exit, so an exact key is always current.
                debug_assert_eq!(*generation, self.generation);
                self.bottom_ord = *ord;
                self.bottom_exact = true;
            }
            CachedKey::Resolved(None) => {
                self.bottom_ord = self.missing_ord;
                self.bottom_exact = true;
                self.keys[slot] = CachedKey::Exact {
                    ord: self.missing_ord,
                    generation: self.generation,
                };
            }
            CachedKey::Resolved(Some(bytes)) => {
                let Some(sorted) = &self.current else {
                    debug_assert!(false, "cross-segment slot implies a prior segment");
                    self.bottom_ord = self.missing_ord;
                    self.bottom_exact = false;
                    return;
                };
                let ord = sorted.lookup_term(bytes);
                if ord >= 0 {
                    self.bottom_ord = ord;
                    self.bottom_exact = true;
                    self.keys[slot] = CachedKey::Exact {
                        ord,
                        generation: self.generation,
                    };
                } else {
                    // The bottom value is absent from this segment's
                    // dictionary: keep the ordinal of the greatest term
                    // below it as a lower bound.
                    self.bottom_ord = -ord - 2;
                    self.bottom_exact = false;
                }
            }
        }
    }

    fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        let doc_ord = self.doc_ord(doc)?;
        if self.bottom_exact {
            Ok(self.bottom_ord.cmp(&doc_ord))
        } else if self.bottom_ord >= doc_ord {
            // At or below the lower bound, hence strictly below the true
            // bottom value.
            Ok(Ordering::Greater)
        } else {
            Ok(Ordering::Less)
        }
    }

    fn set_top_value(&mut self, value: &SortValue) -> Result<()> {
        let bytes = match value {
            SortValue::Bytes(b) => Some(Arc::from(b.as_slice())),
            SortValue::Null => None,
            other => {
                return Err(XiphosError::sort(format!(
                    "boundary value {:?} does not match term field '{}'",
                    other, self.field
                )));
            }
        };
        self.top = Some(TopState {
            value: bytes,
            ord: 0,
            exact: false,
        });
        self.resolve_top();
        Ok(())
    }

    fn compare_top(&mut self, doc: u32) -> Result<Ordering> {
        let doc_ord = self.doc_ord(doc)?;
        let top = self.top.as_ref().ok_or_else(|| {
            XiphosError::invalid_operation("compare_top called before set_top_value")
        })?;
        if top.exact {
            Ok(top.ord.cmp(&doc_ord))
        } else if top.ord >= doc_ord {
            // The boundary value lies strictly between ord and ord + 1 of
            // this segment's dictionary, so equality cannot occur.
            Ok(Ordering::Greater)
        } else {
            Ok(Ordering::Less)
        }
    }

    fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        let ord = self.doc_ord(doc)?;
        self.keys[slot] = CachedKey::Exact {
            ord,
            generation: self.generation,
        };
        Ok(())
    }

    fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()> {
        // Demote every ordinal captured in the outgoing segment to its
        // byte value while the outgoing dictionary is still at hand.
        if let Some(outgoing) = &self.current {
            for key in &mut self.keys {
                if let CachedKey::Exact { ord, generation } = key
                    && *generation == self.generation
                {
                    let bytes = if *ord == self.missing_ord {
                        None
                    } else {
                        Some(outgoing.lookup_ord(*ord))
                    };
                    *key = CachedKey::Resolved(bytes);
                }
            }
        }

        self.generation += 1;
        self.current = Some(ctx.doc_values.sorted(&self.field)?);

        // Both bounds must be valid before any document of the new segment
        // is compared.
        self.resolve_top();
        if let Some(slot) = self.bottom_slot {
            self.set_bottom(slot);
        }
        Ok(())
    }

    fn value(&self, slot: usize) -> SortValue {
        match self.key_bytes(&self.keys[slot]) {
            Some(bytes) => SortValue::bytes(&bytes),
            None => SortValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_values::memory::MemorySegmentBuilder;

    /// Terms per doc; `None` leaves the doc without a value.
    fn segment(terms: &[Option<&str>]) -> SegmentContext {
        let mut builder = MemorySegmentBuilder::new(terms.len() as u32);
        for (doc, term) in terms.iter().enumerate() {
            if let Some(term) = term {
                builder.set_str("title", doc as u32, term).unwrap();
            }
        }
        SegmentContext::new(0, terms.len() as u32, Arc::new(builder.build()))
    }

    #[test]
    fn test_within_segment_ordinal_compare() {
        let ctx = segment(&[Some("cherry"), Some("apple"), Some("banana")]);
        let mut comparator = TermOrdinalComparator::new("title", MissingPolicy::First, 3);
        comparator.set_next_segment(&ctx).unwrap();
        comparator.copy(0, 0).unwrap();
        comparator.copy(1, 1).unwrap();
        comparator.copy(2, 2).unwrap();

        assert_eq!(comparator.compare(1, 2), Ordering::Less);
        assert_eq!(comparator.compare(0, 1), Ordering::Greater);
        assert_eq!(comparator.compare(0, 0), Ordering::Equal);
        assert_eq!(comparator.value(1), SortValue::Bytes(b"apple".to_vec()));
    }

    #[test]
    fn test_missing_placement() {
        let ctx = segment(&[Some("apple"), None]);
        let mut first = TermOrdinalComparator::new("title", MissingPolicy::First, 2);
        first.set_next_segment(&ctx).unwrap();
        first.copy(0, 0).unwrap();
        first.copy(1, 1).unwrap();
        assert_eq!(first.compare(1, 0), Ordering::Less);
        assert_eq!(first.value(1), SortValue::Null);

        let ctx = segment(&[Some("zzz"), None]);
        let mut last = TermOrdinalComparator::new("title", MissingPolicy::Last, 2);
        last.set_next_segment(&ctx).unwrap();
        last.copy(0, 0).unwrap();
        last.copy(1, 1).unwrap();
        assert_eq!(last.compare(1, 0), Ordering::Greater);
    }

    #[test]
    fn test_cross_segment_byte_fallback() {
        let first = segment(&[Some("cherry"), Some("apple")]);
        let second = segment(&[Some("banana"), Some("date")]);

        let mut comparator = TermOrdinalComparator::new("title", MissingPolicy::First, 4);
        comparator.set_next_segment(&first).unwrap();
        comparator.copy(0, 0).unwrap(); // cherry
        comparator.copy(1, 1).unwrap(); // apple

        comparator.set_next_segment(&second).unwrap();
        comparator.copy(2, 0).unwrap(); // banana
        comparator.copy(3, 1).unwrap(); // date

        // Slots from different generations agree with plain byte order.
        assert_eq!(comparator.compare(1, 2), Ordering::Less); // apple < banana
        assert_eq!(comparator.compare(0, 2), Ordering::Greater); // cherry > banana
        assert_eq!(comparator.compare(0, 3), Ordering::Less); // cherry < date
        // Old-generation slots still report their byte values.
        assert_eq!(comparator.value(0), SortValue::Bytes(b"cherry".to_vec()));
    }

    #[test]
    fn test_bottom_reresolved_exactly_across_segments() {
        let first = segment(&[Some("banana")]);
        let second = segment(&[Some("apple"), Some("banana"), Some("cherry")]);

        let mut comparator = TermOrdinalComparator::new("title", MissingPolicy::First, 2);
        comparator.set_next_segment(&first).unwrap();
        comparator.copy(0, 0).unwrap();
        comparator.set_bottom(0);

        // "banana" exists in the second dictionary: exact resolution.
        comparator.set_next_segment(&second).unwrap();
        assert_eq!(comparator.compare_bottom(0).unwrap(), Ordering::Greater);
        assert_eq!(comparator.compare_bottom(1).unwrap(), Ordering::Equal);
        assert_eq!(comparator.compare_bottom(2).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_bottom_lower_bound_when_absent() {
        let first = segment(&[Some("banana")]);
        let second = segment(&[Some("apple"), Some("cherry")]);

        let mut comparator = TermOrdinalComparator::new("title", MissingPolicy::First, 2);
        comparator.set_next_segment(&first).unwrap();
        comparator.copy(0, 0).unwrap();
        comparator.set_bottom(0);

        // "banana" is absent from the second dictionary; bottom degrades
        // to a lower bound that still answers "is the candidate worse?".
        comparator.set_next_segment(&second).unwrap();
        assert_eq!(comparator.compare_bottom(0).unwrap(), Ordering::Greater); // apple
        assert_eq!(comparator.compare_bottom(1).unwrap(), Ordering::Less); // cherry
    }

    #[test]
    fn test_top_boundary_across_segments() {
        let ctx = segment(&[Some("apple"), Some("banana"), Some("cherry")]);
        let mut comparator = TermOrdinalComparator::new("title", MissingPolicy::First, 1);
        comparator
            .set_top_value(&SortValue::Bytes(b"banana".to_vec()))
            .unwrap();
        comparator.set_next_segment(&ctx).unwrap();

        assert_eq!(comparator.compare_top(0).unwrap(), Ordering::Greater);
        assert_eq!(comparator.compare_top(1).unwrap(), Ordering::Equal);
        assert_eq!(comparator.compare_top(2).unwrap(), Ordering::Less);

        // Boundary absent from the dictionary: equality cannot occur.
        let sparse = segment(&[Some("apple"), Some("cherry")]);
        comparator.set_next_segment(&sparse).unwrap();
        assert_eq!(comparator.compare_top(0).unwrap(), Ordering::Greater);
        assert_eq!(comparator.compare_top(1).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_segment_transition_idempotence() {
        let first = segment(&[Some("banana"), Some("apple")]);
        let second = segment(&[Some("cherry"), Some("banana")]);

        let mut once = TermOrdinalComparator::new("title", MissingPolicy::First, 2);
        once.set_next_segment(&first).unwrap();
        once.copy(0, 0).unwrap();
        once.copy(1, 1).unwrap();
        once.set_bottom(0);
        once.set_next_segment(&second).unwrap();

        let mut twice = TermOrdinalComparator::new("title", MissingPolicy::First, 2);
        twice.set_next_segment(&first).unwrap();
        twice.copy(0, 0).unwrap();
        twice.copy(1, 1).unwrap();
        twice.set_bottom(0);
        twice.set_next_segment(&second).unwrap();
        twice.set_next_segment(&second).unwrap();

        for doc in 0..2 {
            assert_eq!(
                once.compare_bottom(doc).unwrap(),
                twice.compare_bottom(doc).unwrap()
            );
        }
        assert_eq!(once.compare(0, 1), twice.compare(0, 1));
        assert_eq!(once.value(0), twice.value(0));
        assert_eq!(once.value(1), twice.value(1));
    }
}
