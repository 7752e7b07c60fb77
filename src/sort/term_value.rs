//! Term comparator over raw byte values.
//!
//! The fallback for term fields without a usable ordinal dictionary: every
//! comparison is done directly on byte sequences. Slots distinguish a
//! missing value from a present empty value, so "no value" and "empty
//! string" never collapse into the same outcome. Missing always sorts
//! first; unlike the ordinal comparator this policy is not configurable.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use crate::doc_values::BinaryValues;
use crate::error::{Result, XiphosError};
use crate::segment::SegmentContext;
use crate::sort::comparator::FieldComparator;
use crate::sort::SortValue;

/// A slot's byte value; `None` marks a missing value.
type BytesKey = Option<Arc<[u8]>>;

/// Comparator for a term field compared directly on byte values.
pub struct TermValueComparator {
    /// Field name.
    field: String,
    /// Cached byte value per slot.
    values: Vec<BytesKey>,
    /// Value of the weakest admitted slot.
    bottom: Option<BytesKey>,
    /// Deep-paging boundary value.
    top: Option<BytesKey>,
    /// Accessor for the current segment.
    current: Option<Arc<dyn BinaryValues>>,
}

impl TermValueComparator {
    /// Create a comparator sized to `k` slots.
    pub fn new<S: Into<String>>(field: S, k: usize) -> Self {
        TermValueComparator {
            field: field.into(),
            values: vec![None; k],
            bottom: None,
            top: None,
            current: None,
        }
    }

    fn key_for(&self, doc: u32) -> Result<BytesKey> {
        let accessor = self.current.as_ref().ok_or_else(|| {
            XiphosError::invalid_operation(format!(
                "term comparator for '{}' used before a segment was set",
                self.field
            ))
        })?;
        Ok(accessor.get(doc))
    }

    /// Missing sorts first, before every present value including the empty
    /// one.
    fn compare_keys(a: &BytesKey, b: &BytesKey) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl Debug for TermValueComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermValueComparator")
            .field("field", &self.field)
            .field("slots", &self.values.len())
            .finish()
    }
}

impl FieldComparator for TermValueComparator {
    fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering {
        Self::compare_keys(&self.values[slot_a], &self.values[slot_b])
    }

    fn set_bottom(&mut self, slot: usize) {
        self.bottom = Some(self.values[slot].clone());
    }

    fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        let key = self.key_for(doc)?;
        let bottom = self.bottom.as_ref().ok_or_else(|| {
            XiphosError::invalid_operation("compare_bottom called before set_bottom")
        })?;
        Ok(Self::compare_keys(bottom, &key))
    }

    fn set_top_value(&mut self, value: &SortValue) -> Result<()> {
        let key = match value {
            SortValue::Bytes(b) => Some(Arc::from(b.as_slice())),
            SortValue::Null => None,
            other => {
                return Err(XiphosError::sort(format!(
                    "boundary value {:?} does not match term field '{}'",
                    other, self.field
                )));
            }
        };
        self.top = Some(key);
        Ok(())
    }

    fn compare_top(&mut self, doc: u32) -> Result<Ordering> {
        let key = self.key_for(doc)?;
        let top = self.top.as_ref().ok_or_else(|| {
            XiphosError::invalid_operation("compare_top called before set_top_value")
        })?;
        Ok(Self::compare_keys(top, &key))
    }

    fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        self.values[slot] = self.key_for(doc)?;
        Ok(())
    }

    fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()> {
        self.current = Some(ctx.doc_values.binary(&self.field)?);
        Ok(())
    }

    fn value(&self, slot: usize) -> SortValue {
        match &self.values[slot] {
            Some(bytes) => SortValue::bytes(bytes),
            None => SortValue::Null,
        }
    }
}
