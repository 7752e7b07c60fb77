//! Numeric field comparators, generic over the supported widths.
//!
//! One comparator implementation covers `i8`, `i16`, `i32`, `i64`, `f32`
//! and `f64` fields through the [`NumericKey`] trait. Floating widths
//! compare under the IEEE total order, which gives the deterministic
//! signed-zero tie-break (`-0.0` before `+0.0`) the sort contract requires.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

use crate::doc_values::{ExistenceBits, NumericValues, SegmentDocValues};
use crate::error::{Result, XiphosError};
use crate::segment::SegmentContext;
use crate::sort::SortValue;
use crate::sort::comparator::FieldComparator;

/// A numeric sort-key type.
pub trait NumericKey: Copy + Default + Debug + Send + Sync + 'static {
    /// Compare two keys in natural order. Must be a total order.
    fn compare_keys(a: Self, b: Self) -> Ordering;

    /// Check for the type's zero, the value accessors report for absent
    /// documents. For floating widths both zero representations match.
    fn is_zero(self) -> bool;

    /// Fetch the typed accessor for a field from a segment's doc values.
    fn accessor(
        values: &dyn SegmentDocValues,
        field: &str,
    ) -> Result<Arc<dyn NumericValues<Self>>>;

    /// Wrap a key into its reported [`SortValue`] variant.
    fn to_sort_value(self) -> SortValue;

    /// Extract a key from a [`SortValue`] boundary, if the variant matches.
    fn from_sort_value(value: &SortValue) -> Option<Self>;
}

macro_rules! integer_key {
    ($ty:ty, $variant:ident, $method:ident) => {
        impl NumericKey for $ty {
            fn compare_keys(a: Self, b: Self) -> Ordering {
                a.cmp(&b)
            }

            fn is_zero(self) -> bool {
                self == 0
            }

            fn accessor(
                values: &dyn SegmentDocValues,
                field: &str,
            ) -> Result<Arc<dyn NumericValues<Self>>> {
                values.$method(field)
            }

            fn to_sort_value(self) -> SortValue {
                SortValue::$variant(self)
            }

            fn from_sort_value(value: &SortValue) -> Option<Self> {
                match value {
                    SortValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! float_key {
    ($ty:ty, $variant:ident, $method:ident) => {
        impl NumericKey for $ty {
            fn compare_keys(a: Self, b: Self) -> Ordering {
                a.total_cmp(&b)
            }

            fn is_zero(self) -> bool {
                self == 0.0
            }

            fn accessor(
                values: &dyn SegmentDocValues,
                field: &str,
            ) -> Result<Arc<dyn NumericValues<Self>>> {
                values.$method(field)
            }

            fn to_sort_value(self) -> SortValue {
                SortValue::$variant(self)
            }

            fn from_sort_value(value: &SortValue) -> Option<Self> {
                match value {
                    SortValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

integer_key!(i8, I8, numeric_i8);
integer_key!(i16, I16, numeric_i16);
integer_key!(i32, I32, numeric_i32);
integer_key!(i64, I64, numeric_i64);
float_key!(f32, F32, numeric_f32);
float_key!(f64, F64, numeric_f64);

/// Comparator for a numeric field.
///
/// Holds one cached key per slot. Documents without a value read as the
/// type's zero; when a missing substitute is configured, the existence
/// bitset is consulted (only for zero raw values) and the substitute is
/// applied before any comparison or copy. Without a substitute the bitset
/// is never acquired and missing simply sorts as literal zero.
pub struct NumericComparator<T: NumericKey> {
    /// Field name.
    field: String,
    /// Substitute applied to documents without a value.
    missing: Option<T>,
    /// Cached key per slot.
    values: Vec<T>,
    /// Key of the weakest admitted slot.
    bottom: T,
    /// Deep-paging boundary key.
    top: Option<T>,
    /// Accessor for the current segment.
    current: Option<Arc<dyn NumericValues<T>>>,
    /// Existence bitset for the current segment, when substitution is on
    /// and the segment has documents without the field.
    existence: Option<Arc<dyn ExistenceBits>>,
}

impl<T: NumericKey> NumericComparator<T> {
    /// Create a comparator sized to `k` slots.
    pub fn new<S: Into<String>>(field: S, missing: Option<T>, k: usize) -> Self {
        NumericComparator {
            field: field.into(),
            missing,
            values: vec![T::default(); k],
            bottom: T::default(),
            top: None,
            current: None,
            existence: None,
        }
    }

    fn key_for(&self, doc: u32) -> Result<T> {
        let accessor = self.current.as_ref().ok_or_else(|| {
            XiphosError::invalid_operation(format!(
                "numeric comparator for '{}' used before a segment was set",
                self.field
            ))
        })?;
        let mut value = accessor.get(doc);
        if value.is_zero()
            && let Some(missing) = self.missing
            && let Some(bits) = &self.existence
            && !bits.has(doc)
        {
            value = missing;
        }
        Ok(value)
    }
}

impl<T: NumericKey> Debug for NumericComparator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumericComparator")
            .field("field", &self.field)
            .field("missing", &self.missing)
            .field("slots", &self.values.len())
            .finish()
    }
}

impl<T: NumericKey> FieldComparator for NumericComparator<T> {
    fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering {
        T::compare_keys(self.values[slot_a], self.values[slot_b])
    }

    fn set_bottom(&mut self, slot: usize) {
        self.bottom = self.values[slot];
    }

    fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        let key = self.key_for(doc)?;
        Ok(T::compare_keys(self.bottom, key))
    }

    fn set_top_value(&mut self, value: &SortValue) -> Result<()> {
        let key = T::from_sort_value(value).ok_or_else(|| {
            XiphosError::sort(format!(
                "boundary value {:?} does not match numeric field '{}'",
                value, self.field
            ))
        })?;
        self.top = Some(key);
        Ok(())
    }

    fn compare_top(&mut self, doc: u32) -> Result<Ordering> {
        let top = self.top.ok_or_else(|| {
            XiphosError::invalid_operation("compare_top called before set_top_value")
        })?;
        let key = self.key_for(doc)?;
        Ok(T::compare_keys(top, key))
    }

    fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        self.values[slot] = self.key_for(doc)?;
        Ok(())
    }

    fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()> {
        self.current = Some(T::accessor(ctx.doc_values.as_ref(), &self.field)?);
        // The bitset only matters when a substitute is configured; without
        // one, missing sorts as literal zero and the lookup is skipped.
        self.existence = if self.missing.is_some() {
            ctx.doc_values.existence_bits(&self.field)?
        } else {
            None
        };
        Ok(())
    }

    fn value(&self, slot: usize) -> SortValue {
        self.values[slot].to_sort_value()
    }
}
