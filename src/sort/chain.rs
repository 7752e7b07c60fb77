//! Lexicographic composition of field comparators.
//!
//! A chain owns one comparator per sort criterion, in request order. Every
//! comparison walks the chain and the first non-equal answer wins; a
//! criterion's `Desc` direction flips its answer before composition. The
//! chain is what the collector actually drives: queue maintenance,
//! deep-paging qualification and final ordering all go through it.

use std::cmp::Ordering;

use crate::error::{Result, XiphosError};
use crate::scoring::Scorer;
use crate::segment::SegmentContext;
use crate::sort::comparator::FieldComparator;
use crate::sort::doc_id::DocIdComparator;
use crate::sort::numeric::NumericComparator;
use crate::sort::relevance::RelevanceComparator;
use crate::sort::term_ordinal::TermOrdinalComparator;
use crate::sort::term_value::TermValueComparator;
use crate::sort::{SortCriterion, SortField, SortOrder, SortValue};

/// An ordered list of comparators implementing a composite sort.
#[derive(Debug)]
pub struct ComparatorChain {
    fields: Vec<SortField>,
    comparators: Vec<Box<dyn FieldComparator>>,
    k: usize,
}

fn apply_order(order: SortOrder, ordering: Ordering) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

impl ComparatorChain {
    /// Build the chain for a sort specification, sized to `k` slots.
    ///
    /// An empty specification, a zero `k`, or more than one relevance
    /// criterion is a configuration error.
    pub fn for_spec(fields: &[SortField], k: usize) -> Result<Self> {
        if fields.is_empty() {
            return Err(XiphosError::sort("sort spec must not be empty"));
        }
        if k == 0 {
            return Err(XiphosError::invalid_argument("k must be positive"));
        }
        let score_criteria = fields
            .iter()
            .filter(|f| matches!(f.criterion, SortCriterion::Score))
            .count();
        if score_criteria > 1 {
            return Err(XiphosError::sort(
                "sort spec may use the relevance criterion at most once",
            ));
        }

        let comparators = fields
            .iter()
            .map(|field| -> Box<dyn FieldComparator> {
                match &field.criterion {
                    SortCriterion::Score => Box::new(RelevanceComparator::new(k)),
                    SortCriterion::DocId => Box::new(DocIdComparator::new(k)),
                    SortCriterion::I8 { field, missing } => {
                        Box::new(NumericComparator::<i8>::new(field, *missing, k))
                    }
                    SortCriterion::I16 { field, missing } => {
                        Box::new(NumericComparator::<i16>::new(field, *missing, k))
                    }
                    SortCriterion::I32 { field, missing } => {
                        Box::new(NumericComparator::<i32>::new(field, *missing, k))
                    }
                    SortCriterion::I64 { field, missing } => {
                        Box::new(NumericComparator::<i64>::new(field, *missing, k))
                    }
                    SortCriterion::F32 { field, missing } => {
                        Box::new(NumericComparator::<f32>::new(field, *missing, k))
                    }
                    SortCriterion::F64 { field, missing } => {
                        Box::new(NumericComparator::<f64>::new(field, *missing, k))
                    }
                    SortCriterion::TermOrdinal { field, missing } => {
                        Box::new(TermOrdinalComparator::new(field, *missing, k))
                    }
                    SortCriterion::TermValue { field } => {
                        Box::new(TermValueComparator::new(field, k))
                    }
                }
            })
            .collect();

        Ok(ComparatorChain {
            fields: fields.to_vec(),
            comparators,
            k,
        })
    }

    /// Get the number of slots the chain was sized to.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Get the sort specification the chain was built from.
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Compare two filled slots under the composite order.
    pub fn compare(&self, slot_a: usize, slot_b: usize) -> Ordering {
        for (field, comparator) in self.fields.iter().zip(&self.comparators) {
            let ordering = apply_order(field.order, comparator.compare(slot_a, slot_b));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Record the weakest admitted slot on every comparator.
    pub fn set_bottom(&mut self, slot: usize) {
        for comparator in &mut self.comparators {
            comparator.set_bottom(slot);
        }
    }

    /// Compare the bottom slot against a candidate document.
    ///
    /// `Greater` means the bottom sorts after the candidate, i.e. the
    /// candidate is competitive.
    pub fn compare_bottom(&mut self, doc: u32) -> Result<Ordering> {
        for (field, comparator) in self.fields.iter().zip(&mut self.comparators) {
            let ordering = apply_order(field.order, comparator.compare_bottom(doc)?);
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Record the deep-paging boundary, one value per criterion.
    pub fn set_top_values(&mut self, values: &[SortValue]) -> Result<()> {
        if values.len() != self.comparators.len() {
            return Err(XiphosError::sort(format!(
                "expected {} boundary values, got {}",
                self.comparators.len(),
                values.len()
            )));
        }
        for (comparator, value) in self.comparators.iter_mut().zip(values) {
            comparator.set_top_value(value)?;
        }
        Ok(())
    }

    /// Compare the deep-paging boundary against a candidate document.
    pub fn compare_top(&mut self, doc: u32) -> Result<Ordering> {
        for (field, comparator) in self.fields.iter().zip(&mut self.comparators) {
            let ordering = apply_order(field.order, comparator.compare_top(doc)?);
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Copy a candidate document's sort keys into a slot on every
    /// comparator.
    pub fn copy(&mut self, slot: usize, doc: u32) -> Result<()> {
        for comparator in &mut self.comparators {
            comparator.copy(slot, doc)?;
        }
        Ok(())
    }

    /// Switch every comparator to a new segment.
    pub fn set_next_segment(&mut self, ctx: &SegmentContext) -> Result<()> {
        for comparator in &mut self.comparators {
            comparator.set_next_segment(ctx)?;
        }
        Ok(())
    }

    /// Wire the segment's scorer into the relevance comparator, if the
    /// chain has one.
    pub fn set_scorer(&mut self, scorer: Box<dyn Scorer>) -> Result<()> {
        for (field, comparator) in self.fields.iter().zip(&mut self.comparators) {
            if matches!(field.criterion, SortCriterion::Score) {
                return comparator.set_scorer(scorer);
            }
        }
        Ok(())
    }

    /// Check whether the chain sorts by relevance anywhere.
    pub fn needs_scores(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f.criterion, SortCriterion::Score))
    }

    /// Report the sort values cached in a slot, one per criterion.
    pub fn values(&self, slot: usize) -> Vec<SortValue> {
        self.comparators.iter().map(|c| c.value(slot)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_values::memory::MemorySegmentBuilder;
    use std::sync::Arc;

    fn two_field_ctx() -> SegmentContext {
        let mut builder = MemorySegmentBuilder::new(4);
        builder.set_i64("year", 0, 2020).unwrap();
        builder.set_i64("year", 1, 2020).unwrap();
        builder.set_i64("year", 2, 1999).unwrap();
        builder.set_i64("year", 3, 2020).unwrap();
        builder.set_f64("rating", 0, 4.0).unwrap();
        builder.set_f64("rating", 1, 2.0).unwrap();
        builder.set_f64("rating", 2, 5.0).unwrap();
        builder.set_f64("rating", 3, 4.0).unwrap();
        SegmentContext::new(0, 4, Arc::new(builder.build()))
    }

    #[test]
    fn test_lexicographic_composition() {
        let spec = vec![
            SortField::i64_field("year"),
            SortField::f64_field("rating").desc(),
        ];
        let mut chain = ComparatorChain::for_spec(&spec, 4).unwrap();
        chain.set_next_segment(&two_field_ctx()).unwrap();
        for slot in 0..4 {
            chain.copy(slot, slot as u32).unwrap();
        }

        // Primary criterion decides when it differs.
        assert_eq!(chain.compare(2, 0), Ordering::Less);
        // Ties fall through to the secondary, which is descending.
        assert_eq!(chain.compare(0, 1), Ordering::Less);
        assert_eq!(chain.compare(1, 0), Ordering::Greater);
        // Full tie on both criteria.
        assert_eq!(chain.compare(0, 3), Ordering::Equal);
    }

    #[test]
    fn test_total_order_properties() {
        let spec = vec![
            SortField::i64_field("year"),
            SortField::f64_field("rating").desc(),
        ];
        let mut chain = ComparatorChain::for_spec(&spec, 4).unwrap();
        chain.set_next_segment(&two_field_ctx()).unwrap();
        for slot in 0..4 {
            chain.copy(slot, slot as u32).unwrap();
        }

        for a in 0..4 {
            for b in 0..4 {
                // Antisymmetry.
                assert_eq!(chain.compare(a, b), chain.compare(b, a).reverse());
                for c in 0..4 {
                    // Transitivity.
                    if chain.compare(a, b) != Ordering::Greater
                        && chain.compare(b, c) != Ordering::Greater
                    {
                        assert_ne!(chain.compare(a, c), Ordering::Greater);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bottom_through_chain() {
        let spec = vec![
            SortField::i64_field("year"),
            SortField::f64_field("rating").desc(),
        ];
        let mut chain = ComparatorChain::for_spec(&spec, 2).unwrap();
        chain.set_next_segment(&two_field_ctx()).unwrap();
        chain.copy(0, 0).unwrap();
        chain.copy(1, 1).unwrap();
        chain.set_bottom(1); // year 2020, rating 2.0

        // doc 2: year 1999 beats the bottom on the primary criterion.
        assert_eq!(chain.compare_bottom(2).unwrap(), Ordering::Greater);
        // doc 3: same year, better rating under desc.
        assert_eq!(chain.compare_bottom(3).unwrap(), Ordering::Greater);
        assert_eq!(chain.compare_bottom(1).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_configuration_errors() {
        assert!(ComparatorChain::for_spec(&[], 10).is_err());
        assert!(ComparatorChain::for_spec(&[SortField::doc_id()], 0).is_err());
        assert!(
            ComparatorChain::for_spec(&[SortField::score(), SortField::score()], 10).is_err()
        );

        let mut chain =
            ComparatorChain::for_spec(&[SortField::i64_field("year")], 10).unwrap();
        assert!(chain.set_top_values(&[]).is_err());
    }

    #[test]
    fn test_unknown_field_fails_at_segment_transition() {
        let mut chain =
            ComparatorChain::for_spec(&[SortField::i64_field("nope")], 2).unwrap();
        let ctx = SegmentContext::new(0, 1, Arc::new(MemorySegmentBuilder::new(1).build()));
        assert!(chain.set_next_segment(&ctx).is_err());
    }
}
