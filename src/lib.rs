//! # Xiphos
//!
//! The result-ranking core of a full-text search engine: stateful per-slot
//! field comparators driven by a bounded top-K collector as it scans
//! postings segment by segment.
//!
//! ## Features
//!
//! - Numeric, term-ordinal, term-byte, relevance and doc-id sort criteria
//! - Lexicographic comparator chains for multi-field sorts
//! - Segment-transition handling with cross-segment ordinal reconciliation
//! - Configurable missing-value placement
//! - Deep paging ("search after") support
//! - Merge of per-worker top-K results for parallel segment scans

pub mod collector;
pub mod doc_values;
pub mod error;
pub mod scoring;
pub mod segment;
pub mod sort;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
