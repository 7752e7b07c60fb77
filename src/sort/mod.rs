//! Sort criteria configuration and reported sort-key values.
//!
//! A search request carries an ordered list of [`SortField`]s; each becomes
//! one comparator in a
//! [`ComparatorChain`](crate::sort::chain::ComparatorChain). The first
//! criterion with a non-equal comparison decides the order of two hits.

pub mod chain;
pub mod comparator;
pub mod doc_id;
pub mod numeric;
pub mod relevance;
pub mod term_ordinal;
pub mod term_value;

pub use chain::ComparatorChain;
pub use comparator::FieldComparator;

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Sort direction applied on top of a criterion's natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// The criterion's natural order.
    Asc,
    /// The reverse of the criterion's natural order.
    Desc,
}

/// Where documents without a value for the sort field are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingPolicy {
    /// Missing documents sort before every document with a value.
    First,
    /// Missing documents sort after every document with a value.
    Last,
}

/// A single sort criterion.
///
/// Numeric criteria carry an optional substitute applied to documents
/// without a value; when no substitute is configured, a missing value sorts
/// as the literal zero of the type. The term-byte criterion has no missing
/// knob: missing hard-codes to sort-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortCriterion {
    /// Relevance score. Natural order ranks higher scores first.
    Score,
    /// Collection-wide document id, ascending.
    DocId,
    /// Numeric field, `i8` values.
    I8 {
        /// Field name.
        field: String,
        /// Substitute for documents without a value.
        missing: Option<i8>,
    },
    /// Numeric field, `i16` values.
    I16 {
        /// Field name.
        field: String,
        /// Substitute for documents without a value.
        missing: Option<i16>,
    },
    /// Numeric field, `i32` values.
    I32 {
        /// Field name.
        field: String,
        /// Substitute for documents without a value.
        missing: Option<i32>,
    },
    /// Numeric field, `i64` values.
    I64 {
        /// Field name.
        field: String,
        /// Substitute for documents without a value.
        missing: Option<i64>,
    },
    /// Numeric field, `f32` values.
    F32 {
        /// Field name.
        field: String,
        /// Substitute for documents without a value.
        missing: Option<f32>,
    },
    /// Numeric field, `f64` values.
    F64 {
        /// Field name.
        field: String,
        /// Substitute for documents without a value.
        missing: Option<f64>,
    },
    /// Sorted-term field compared through per-segment ordinals.
    TermOrdinal {
        /// Field name.
        field: String,
        /// Placement of documents without a value.
        missing: MissingPolicy,
    },
    /// Term field compared directly on byte values. Missing sorts first.
    TermValue {
        /// Field name.
        field: String,
    },
}

/// A sort criterion plus its direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    /// The criterion to sort by.
    pub criterion: SortCriterion,
    /// Sort direction.
    pub order: SortOrder,
}

impl SortField {
    /// Sort by relevance score, best first.
    pub fn score() -> Self {
        SortField {
            criterion: SortCriterion::Score,
            order: SortOrder::Asc,
        }
    }

    /// Sort by collection-wide document id, ascending.
    pub fn doc_id() -> Self {
        SortField {
            criterion: SortCriterion::DocId,
            order: SortOrder::Asc,
        }
    }

    /// Sort by an `i8` field, ascending.
    pub fn i8_field<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::I8 {
                field: field.into(),
                missing: None,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by an `i16` field, ascending.
    pub fn i16_field<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::I16 {
                field: field.into(),
                missing: None,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by an `i32` field, ascending.
    pub fn i32_field<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::I32 {
                field: field.into(),
                missing: None,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by an `i64` field, ascending.
    pub fn i64_field<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::I64 {
                field: field.into(),
                missing: None,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by an `f32` field, ascending.
    pub fn f32_field<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::F32 {
                field: field.into(),
                missing: None,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by an `f64` field, ascending.
    pub fn f64_field<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::F64 {
                field: field.into(),
                missing: None,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by a term field through per-segment ordinals, ascending,
    /// missing first.
    pub fn term_ordinal<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::TermOrdinal {
                field: field.into(),
                missing: MissingPolicy::First,
            },
            order: SortOrder::Asc,
        }
    }

    /// Sort by a term field on raw byte values, ascending.
    pub fn term_value<S: Into<String>>(field: S) -> Self {
        SortField {
            criterion: SortCriterion::TermValue {
                field: field.into(),
            },
            order: SortOrder::Asc,
        }
    }

    /// Reverse the sort direction.
    pub fn desc(mut self) -> Self {
        self.order = SortOrder::Desc;
        self
    }

    /// Set the missing placement for a term-ordinal criterion. Other
    /// criteria are left unchanged.
    pub fn with_missing_policy(mut self, policy: MissingPolicy) -> Self {
        if let SortCriterion::TermOrdinal { missing, .. } = &mut self.criterion {
            *missing = policy;
        }
        self
    }

    /// Natural-order comparison of two reported sort values under this
    /// field's criterion, with the field's direction applied.
    ///
    /// Used when merging top-K results produced by independent
    /// comparator-chain instances.
    pub fn compare_values(&self, a: &SortValue, b: &SortValue) -> Ordering {
        let natural = match (a, b) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Null, _) => {
                if self.missing_last() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (_, SortValue::Null) => {
                if self.missing_last() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            _ => {
                if matches!(self.criterion, SortCriterion::Score) {
                    // Relevance naturally ranks higher scores first.
                    b.compare_same(a)
                } else {
                    a.compare_same(b)
                }
            }
        };
        match self.order {
            SortOrder::Asc => natural,
            SortOrder::Desc => natural.reverse(),
        }
    }

    fn missing_last(&self) -> bool {
        matches!(
            self.criterion,
            SortCriterion::TermOrdinal {
                missing: MissingPolicy::Last,
                ..
            }
        )
    }
}

/// The sort-key value reported for one hit under one criterion.
///
/// A tagged union over the supported sort-key types; `Null` marks a missing
/// term value (numeric criteria substitute before reporting and never
/// produce it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SortValue {
    /// An `i8` value.
    I8(i8),
    /// An `i16` value.
    I16(i16),
    /// An `i32` value.
    I32(i32),
    /// An `i64` value.
    I64(i64),
    /// An `f32` value (also relevance scores).
    F32(f32),
    /// An `f64` value.
    F64(f64),
    /// A `u64` value (collection-wide document ids).
    U64(u64),
    /// A term byte value.
    Bytes(Vec<u8>),
    /// No value.
    Null,
}

impl SortValue {
    /// Build a byte-valued sort value from a shared buffer.
    pub fn bytes(buffer: &Arc<[u8]>) -> Self {
        SortValue::Bytes(buffer.as_ref().to_vec())
    }

    /// Compare two values of the same variant in natural order.
    ///
    /// Floating variants use the IEEE total order, so `-0.0` sorts before
    /// `+0.0` deterministically. Comparing different variants is a
    /// programmer error and yields `Equal`.
    pub fn compare_same(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::I8(a), SortValue::I8(b)) => a.cmp(b),
            (SortValue::I16(a), SortValue::I16(b)) => a.cmp(b),
            (SortValue::I32(a), SortValue::I32(b)) => a.cmp(b),
            (SortValue::I64(a), SortValue::I64(b)) => a.cmp(b),
            (SortValue::F32(a), SortValue::F32(b)) => a.total_cmp(b),
            (SortValue::F64(a), SortValue::F64(b)) => a.total_cmp(b),
            (SortValue::U64(a), SortValue::U64(b)) => a.cmp(b),
            (SortValue::Bytes(a), SortValue::Bytes(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}
