//! Merging of top-K results from independent collector instances.
//!
//! Segment-scoped comparator state (docBase, existence bitsets, dictionary
//! accessors) cannot be shared between concurrently scanned segments, so
//! parallel search gives each worker its own comparator chain and merges
//! the per-worker results afterwards. The merge orders hits by their
//! reported sort-value rows under the same specification the workers
//! sorted by, breaks full ties on ascending doc id, and drops duplicate
//! doc ids.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;

use crate::collector::{FieldHit, FieldResults, TopFieldCollector};
use crate::error::{Result, XiphosError};
use crate::sort::SortField;

/// Compare two hits by their sort-value rows under a specification.
fn compare_hits(spec: &[SortField], a: &FieldHit, b: &FieldHit) -> Ordering {
    for (field, (value_a, value_b)) in spec
        .iter()
        .zip(a.sort_values.iter().zip(b.sort_values.iter()))
    {
        let ordering = field.compare_values(value_a, value_b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.doc.cmp(&b.doc)
}

/// Merge per-worker results into a single top-K under the same sort
/// specification the workers used.
pub fn merge_results(
    spec: &[SortField],
    k: usize,
    partials: Vec<FieldResults>,
) -> Result<FieldResults> {
    let mut total_hits = 0u64;
    let mut all = Vec::new();
    for partial in partials {
        total_hits += partial.total_hits;
        all.extend(partial.hits);
    }
    for hit in &all {
        if hit.sort_values.len() != spec.len() {
            return Err(XiphosError::sort(format!(
                "hit for doc {} carries {} sort values, spec has {}",
                hit.doc,
                hit.sort_values.len(),
                spec.len()
            )));
        }
    }

    all.sort_by(|a, b| compare_hits(spec, a, b));

    let mut seen = HashSet::new();
    let mut hits = Vec::with_capacity(k.min(all.len()));
    for hit in all {
        if hits.len() >= k {
            break;
        }
        // Skip duplicates (same doc collected by more than one worker).
        if seen.insert(hit.doc) {
            hits.push(hit);
        }
    }

    Ok(FieldResults { hits, total_hits })
}

/// Run one collector per partition in parallel and merge the results.
///
/// `run` drives partition `p`'s collector through its segments; every
/// worker gets its own comparator-chain instance, per the single-owner
/// scheduling model.
pub fn collect_partitioned<F>(
    spec: &[SortField],
    k: usize,
    partitions: usize,
    run: F,
) -> Result<FieldResults>
where
    F: Fn(usize, &mut TopFieldCollector) -> Result<()> + Sync,
{
    let partials = (0..partitions)
        .into_par_iter()
        .map(|partition| {
            let mut collector = TopFieldCollector::new(spec, k)?;
            run(partition, &mut collector)?;
            Ok(collector.into_results())
        })
        .collect::<Result<Vec<_>>>()?;

    merge_results(spec, k, partials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_values::memory::MemorySegmentBuilder;
    use crate::segment::SegmentContext;
    use crate::sort::SortValue;
    use std::sync::Arc;

    fn hit(doc: u64, year: i64) -> FieldHit {
        FieldHit {
            doc,
            score: 0.0,
            sort_values: vec![SortValue::I64(year)],
        }
    }

    #[test]
    fn test_merge_orders_across_workers() {
        let spec = vec![SortField::i64_field("year")];
        let left = FieldResults {
            hits: vec![hit(0, 1999), hit(1, 2005)],
            total_hits: 4,
        };
        let right = FieldResults {
            hits: vec![hit(10, 2001), hit(11, 2020)],
            total_hits: 3,
        };

        let merged = merge_results(&spec, 3, vec![left, right]).unwrap();
        assert_eq!(merged.total_hits, 7);
        let docs: Vec<u64> = merged.hits.iter().map(|h| h.doc).collect();
        assert_eq!(docs, vec![0, 10, 1]); // 1999, 2001, 2005
    }

    #[test]
    fn test_merge_dedups_and_tie_breaks() {
        let spec = vec![SortField::i64_field("year")];
        let left = FieldResults {
            hits: vec![hit(7, 2000), hit(3, 2000)],
            total_hits: 2,
        };
        let right = FieldResults {
            hits: vec![hit(7, 2000), hit(1, 2000)],
            total_hits: 2,
        };

        let merged = merge_results(&spec, 10, vec![left, right]).unwrap();
        let docs: Vec<u64> = merged.hits.iter().map(|h| h.doc).collect();
        assert_eq!(docs, vec![1, 3, 7]);
    }

    #[test]
    fn test_merge_rejects_mismatched_rows() {
        let spec = vec![SortField::i64_field("year"), SortField::doc_id()];
        let partial = FieldResults {
            hits: vec![hit(0, 1999)],
            total_hits: 1,
        };
        assert!(merge_results(&spec, 5, vec![partial]).is_err());
    }

    #[test]
    fn test_collect_partitioned() {
        let spec = vec![SortField::i64_field("year")];
        let partitions: Vec<SegmentContext> = [(0u64, vec![2005i64, 1999]), (2, vec![2001, 2020])]
            .into_iter()
            .map(|(doc_base, years)| {
                let mut builder = MemorySegmentBuilder::new(years.len() as u32);
                for (doc, year) in years.iter().enumerate() {
                    builder.set_i64("year", doc as u32, *year).unwrap();
                }
                SegmentContext::new(doc_base, years.len() as u32, Arc::new(builder.build()))
            })
            .collect();

        let results = collect_partitioned(&spec, 2, partitions.len(), |p, collector| {
            let ctx = &partitions[p];
            collector.set_next_segment(ctx)?;
            for doc in 0..ctx.doc_count {
                collector.collect(doc)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(results.total_hits, 4);
        let docs: Vec<u64> = results.hits.iter().map(|h| h.doc).collect();
        assert_eq!(docs, vec![1, 2]); // 1999, 2001
    }
}
