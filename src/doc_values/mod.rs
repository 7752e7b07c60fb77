//! Column-oriented per-field value access for sorting.
//!
//! Comparators never touch storage directly; they read typed, per-segment
//! accessors obtained from a [`SegmentDocValues`] dispatcher:
//!
//! - numeric accessors return a document's value, or the type's zero when
//!   the document has none;
//! - an existence bitset distinguishes a stored zero from an absent value;
//! - sorted-term accessors expose the segment's term dictionary through
//!   dense ordinals, with lookups in both directions;
//! - binary accessors return a document's raw byte value.
//!
//! Storage backends implement these traits per segment; the in-memory
//! implementation in [`memory`] is the one the test suite drives.

pub mod memory;

use std::sync::Arc;

use crate::error::Result;

// Per-document reads are infallible: a segment's columns and term
// dictionary are memory-resident once the accessor has been acquired, so
// storage failures surface at acquisition time through [`SegmentDocValues`]
// and abort the whole request there.

/// Typed per-document numeric accessor for a single field in one segment.
///
/// Documents without a value for the field report the type's zero; callers
/// that must distinguish a stored zero from an absent value consult the
/// field's [`ExistenceBits`].
pub trait NumericValues<T>: Send + Sync {
    /// Get the value for a document, or zero if the document has none.
    fn get(&self, doc: u32) -> T;
}

/// Per-document existence bitset for a single field in one segment.
pub trait ExistenceBits: Send + Sync {
    /// Check whether the document has a value for the field.
    fn has(&self, doc: u32) -> bool;
}

/// Sorted-term accessor for a single field in one segment.
///
/// Terms are addressed by dense ordinals in `[0, value_count())`, assigned
/// in lexicographic byte order. Ordinals are only comparable against
/// ordinals from the same segment.
pub trait SortedValues: Send + Sync {
    /// Get the term ordinal for a document, or `-1` if the document has no
    /// value for the field.
    fn ord(&self, doc: u32) -> i64;

    /// Get the number of unique terms in this segment's dictionary.
    fn value_count(&self) -> i64;

    /// Look up the term bytes for an ordinal.
    ///
    /// The ordinal must be in `[0, value_count())`; anything else is a
    /// programmer error.
    fn lookup_ord(&self, ord: i64) -> Arc<[u8]>;

    /// Look up the ordinal for a term.
    ///
    /// Returns the ordinal if the term is present in this segment's
    /// dictionary; otherwise `-(insertion_point) - 1`, where
    /// `insertion_point` is the ordinal the term would be inserted at.
    fn lookup_term(&self, key: &[u8]) -> i64;
}

/// Raw byte-value accessor for a single field in one segment.
pub trait BinaryValues: Send + Sync {
    /// Get the byte value for a document, or `None` if the document has no
    /// value for the field. An empty buffer is a present empty value, not a
    /// missing one.
    fn get(&self, doc: u32) -> Option<Arc<[u8]>>;
}

/// Per-segment dispatcher from field names to typed accessors.
///
/// One instance exists per segment; comparators reacquire their accessors
/// from it on every segment transition. A field that does not exist, or
/// whose column has a different type than requested, is a configuration
/// error surfaced before scanning begins.
pub trait SegmentDocValues: Send + Sync {
    /// Get the `i8` numeric accessor for a field.
    fn numeric_i8(&self, field: &str) -> Result<Arc<dyn NumericValues<i8>>>;

    /// Get the `i16` numeric accessor for a field.
    fn numeric_i16(&self, field: &str) -> Result<Arc<dyn NumericValues<i16>>>;

    /// Get the `i32` numeric accessor for a field.
    fn numeric_i32(&self, field: &str) -> Result<Arc<dyn NumericValues<i32>>>;

    /// Get the `i64` numeric accessor for a field.
    fn numeric_i64(&self, field: &str) -> Result<Arc<dyn NumericValues<i64>>>;

    /// Get the `f32` numeric accessor for a field.
    fn numeric_f32(&self, field: &str) -> Result<Arc<dyn NumericValues<f32>>>;

    /// Get the `f64` numeric accessor for a field.
    fn numeric_f64(&self, field: &str) -> Result<Arc<dyn NumericValues<f64>>>;

    /// Get the existence bitset for a field.
    ///
    /// Returns `Ok(None)` when every document in the segment has a value
    /// for the field, letting callers skip per-document bitset lookups.
    fn existence_bits(&self, field: &str) -> Result<Option<Arc<dyn ExistenceBits>>>;

    /// Get the sorted-term accessor for a field.
    fn sorted(&self, field: &str) -> Result<Arc<dyn SortedValues>>;

    /// Get the raw byte-value accessor for a field.
    fn binary(&self, field: &str) -> Result<Arc<dyn BinaryValues>>;
}
