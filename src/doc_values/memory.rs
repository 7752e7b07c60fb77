//! In-memory columnar doc values.
//!
//! A [`MemorySegmentBuilder`] accepts typed per-document values and builds a
//! [`MemorySegment`] whose sorted fields carry a deduplicated,
//! lexicographically ordered term dictionary with dense ordinals. This is
//! the value source the test suite and benches drive the comparators with;
//! persistent storage backends implement the same traits.

use std::collections::BTreeSet;
use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;

use crate::doc_values::{
    BinaryValues, ExistenceBits, NumericValues, SegmentDocValues, SortedValues,
};
use crate::error::{Result, XiphosError};

/// Builder for an in-memory doc-values segment.
#[derive(Debug)]
pub struct MemorySegmentBuilder {
    /// Number of documents in the segment.
    doc_count: u32,
    /// Columns being built (field_name -> pending column).
    fields: AHashMap<String, PendingColumn>,
}

/// A column under construction, one value slot per document.
#[derive(Debug)]
enum PendingColumn {
    I8(Vec<Option<i8>>),
    I16(Vec<Option<i16>>),
    I32(Vec<Option<i32>>),
    I64(Vec<Option<i64>>),
    F32(Vec<Option<f32>>),
    F64(Vec<Option<f64>>),
    Sorted(Vec<Option<Vec<u8>>>),
    Binary(Vec<Option<Vec<u8>>>),
}

impl PendingColumn {
    fn kind(&self) -> &'static str {
        match self {
            PendingColumn::I8(_) => "i8",
            PendingColumn::I16(_) => "i16",
            PendingColumn::I32(_) => "i32",
            PendingColumn::I64(_) => "i64",
            PendingColumn::F32(_) => "f32",
            PendingColumn::F64(_) => "f64",
            PendingColumn::Sorted(_) => "sorted",
            PendingColumn::Binary(_) => "binary",
        }
    }
}

macro_rules! numeric_setter {
    ($name:ident, $variant:ident, $ty:ty) => {
        /// Set a numeric value for a document.
        pub fn $name(&mut self, field: &str, doc: u32, value: $ty) -> Result<()> {
            self.check_doc(doc)?;
            let doc_count = self.doc_count as usize;
            let column = self
                .fields
                .entry(field.to_string())
                .or_insert_with(|| PendingColumn::$variant(vec![None; doc_count]));
            match column {
                PendingColumn::$variant(values) => {
                    values[doc as usize] = Some(value);
                    Ok(())
                }
                other => Err(XiphosError::field(format!(
                    "field '{}' already has {} values",
                    field,
                    other.kind()
                ))),
            }
        }
    };
}

impl MemorySegmentBuilder {
    /// Create a builder for a segment with the given document count.
    pub fn new(doc_count: u32) -> Self {
        MemorySegmentBuilder {
            doc_count,
            fields: AHashMap::new(),
        }
    }

    fn check_doc(&self, doc: u32) -> Result<()> {
        if doc >= self.doc_count {
            return Err(XiphosError::invalid_argument(format!(
                "doc {} out of range for segment of {} docs",
                doc, self.doc_count
            )));
        }
        Ok(())
    }

    numeric_setter!(set_i8, I8, i8);
    numeric_setter!(set_i16, I16, i16);
    numeric_setter!(set_i32, I32, i32);
    numeric_setter!(set_i64, I64, i64);
    numeric_setter!(set_f32, F32, f32);
    numeric_setter!(set_f64, F64, f64);

    /// Set a sorted-term value for a document.
    pub fn set_term(&mut self, field: &str, doc: u32, term: &[u8]) -> Result<()> {
        self.check_doc(doc)?;
        let doc_count = self.doc_count as usize;
        let column = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| PendingColumn::Sorted(vec![None; doc_count]));
        match column {
            PendingColumn::Sorted(values) => {
                values[doc as usize] = Some(term.to_vec());
                Ok(())
            }
            other => Err(XiphosError::field(format!(
                "field '{}' already has {} values",
                field,
                other.kind()
            ))),
        }
    }

    /// Set a sorted-term value for a document from a string.
    pub fn set_str(&mut self, field: &str, doc: u32, term: &str) -> Result<()> {
        self.set_term(field, doc, term.as_bytes())
    }

    /// Set a raw byte value for a document.
    pub fn set_bytes(&mut self, field: &str, doc: u32, bytes: &[u8]) -> Result<()> {
        self.check_doc(doc)?;
        let doc_count = self.doc_count as usize;
        let column = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| PendingColumn::Binary(vec![None; doc_count]));
        match column {
            PendingColumn::Binary(values) => {
                values[doc as usize] = Some(bytes.to_vec());
                Ok(())
            }
            other => Err(XiphosError::field(format!(
                "field '{}' already has {} values",
                field,
                other.kind()
            ))),
        }
    }

    /// Build the immutable segment.
    pub fn build(self) -> MemorySegment {
        let mut fields = AHashMap::with_capacity(self.fields.len());
        for (name, pending) in self.fields {
            let column = match pending {
                PendingColumn::I8(v) => Column::I8(Arc::new(NumericColumn::from_sparse(v))),
                PendingColumn::I16(v) => Column::I16(Arc::new(NumericColumn::from_sparse(v))),
                PendingColumn::I32(v) => Column::I32(Arc::new(NumericColumn::from_sparse(v))),
                PendingColumn::I64(v) => Column::I64(Arc::new(NumericColumn::from_sparse(v))),
                PendingColumn::F32(v) => Column::F32(Arc::new(NumericColumn::from_sparse(v))),
                PendingColumn::F64(v) => Column::F64(Arc::new(NumericColumn::from_sparse(v))),
                PendingColumn::Sorted(v) => Column::Sorted(Arc::new(SortedColumn::from_sparse(v))),
                PendingColumn::Binary(v) => Column::Binary(Arc::new(BinaryColumn::from_sparse(v))),
            };
            fields.insert(name, column);
        }
        MemorySegment {
            doc_count: self.doc_count,
            fields,
        }
    }
}

/// An immutable in-memory doc-values segment.
#[derive(Debug)]
pub struct MemorySegment {
    /// Number of documents in the segment.
    doc_count: u32,
    /// Columns by field name.
    fields: AHashMap<String, Column>,
}

#[derive(Debug)]
enum Column {
    I8(Arc<NumericColumn<i8>>),
    I16(Arc<NumericColumn<i16>>),
    I32(Arc<NumericColumn<i32>>),
    I64(Arc<NumericColumn<i64>>),
    F32(Arc<NumericColumn<f32>>),
    F64(Arc<NumericColumn<f64>>),
    Sorted(Arc<SortedColumn>),
    Binary(Arc<BinaryColumn>),
}

impl Column {
    fn kind(&self) -> &'static str {
        match self {
            Column::I8(_) => "i8",
            Column::I16(_) => "i16",
            Column::I32(_) => "i32",
            Column::I64(_) => "i64",
            Column::F32(_) => "f32",
            Column::F64(_) => "f64",
            Column::Sorted(_) => "sorted",
            Column::Binary(_) => "binary",
        }
    }
}

impl MemorySegment {
    /// Get the number of documents in the segment.
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    fn column(&self, field: &str) -> Result<&Column> {
        self.fields
            .get(field)
            .ok_or_else(|| XiphosError::field(format!("field '{}' has no doc values", field)))
    }

    fn type_mismatch(&self, field: &str, wanted: &str, column: &Column) -> XiphosError {
        XiphosError::field(format!(
            "field '{}' has {} doc values, not {}",
            field,
            column.kind(),
            wanted
        ))
    }
}

macro_rules! numeric_getter {
    ($name:ident, $variant:ident, $ty:ty) => {
        fn $name(&self, field: &str) -> Result<Arc<dyn NumericValues<$ty>>> {
            match self.column(field)? {
                Column::$variant(column) => Ok(column.clone() as Arc<dyn NumericValues<$ty>>),
                other => Err(self.type_mismatch(field, stringify!($ty), other)),
            }
        }
    };
}

impl SegmentDocValues for MemorySegment {
    numeric_getter!(numeric_i8, I8, i8);
    numeric_getter!(numeric_i16, I16, i16);
    numeric_getter!(numeric_i32, I32, i32);
    numeric_getter!(numeric_i64, I64, i64);
    numeric_getter!(numeric_f32, F32, f32);
    numeric_getter!(numeric_f64, F64, f64);

    fn existence_bits(&self, field: &str) -> Result<Option<Arc<dyn ExistenceBits>>> {
        let bits: Arc<dyn ExistenceBits> = match self.column(field)? {
            Column::I8(c) if c.all_present => return Ok(None),
            Column::I16(c) if c.all_present => return Ok(None),
            Column::I32(c) if c.all_present => return Ok(None),
            Column::I64(c) if c.all_present => return Ok(None),
            Column::F32(c) if c.all_present => return Ok(None),
            Column::F64(c) if c.all_present => return Ok(None),
            Column::Sorted(c) if c.all_present => return Ok(None),
            Column::Binary(c) if c.all_present => return Ok(None),
            Column::I8(c) => c.clone(),
            Column::I16(c) => c.clone(),
            Column::I32(c) => c.clone(),
            Column::I64(c) => c.clone(),
            Column::F32(c) => c.clone(),
            Column::F64(c) => c.clone(),
            Column::Sorted(c) => c.clone(),
            Column::Binary(c) => c.clone(),
        };
        Ok(Some(bits))
    }

    fn sorted(&self, field: &str) -> Result<Arc<dyn SortedValues>> {
        match self.column(field)? {
            Column::Sorted(column) => Ok(column.clone() as Arc<dyn SortedValues>),
            other => Err(self.type_mismatch(field, "sorted", other)),
        }
    }

    fn binary(&self, field: &str) -> Result<Arc<dyn BinaryValues>> {
        match self.column(field)? {
            Column::Binary(column) => Ok(column.clone() as Arc<dyn BinaryValues>),
            other => Err(self.type_mismatch(field, "binary", other)),
        }
    }
}

/// Dense numeric column with a presence bitmap.
#[derive(Debug)]
struct NumericColumn<T> {
    values: Vec<T>,
    present: BitVec,
    all_present: bool,
}

impl<T: Copy + Default> NumericColumn<T> {
    fn from_sparse(sparse: Vec<Option<T>>) -> Self {
        let mut present = BitVec::from_elem(sparse.len(), false);
        let mut values = Vec::with_capacity(sparse.len());
        for (doc, value) in sparse.into_iter().enumerate() {
            match value {
                Some(v) => {
                    present.set(doc, true);
                    values.push(v);
                }
                None => values.push(T::default()),
            }
        }
        let all_present = present.all();
        NumericColumn {
            values,
            present,
            all_present,
        }
    }
}

impl<T: Copy + Default + Send + Sync> NumericValues<T> for NumericColumn<T> {
    fn get(&self, doc: u32) -> T {
        self.values.get(doc as usize).copied().unwrap_or_default()
    }
}

impl<T: Send + Sync> ExistenceBits for NumericColumn<T> {
    fn has(&self, doc: u32) -> bool {
        self.present.get(doc as usize).unwrap_or(false)
    }
}

/// Sorted-term column: per-doc ordinals plus the segment term dictionary.
#[derive(Debug)]
struct SortedColumn {
    /// Ordinal per document, -1 when the document has no value.
    ords: Vec<i64>,
    /// Unique terms in lexicographic byte order; index is the ordinal.
    terms: Vec<Arc<[u8]>>,
    present: BitVec,
    all_present: bool,
}

impl SortedColumn {
    fn from_sparse(sparse: Vec<Option<Vec<u8>>>) -> Self {
        let unique: BTreeSet<Vec<u8>> = sparse.iter().flatten().cloned().collect();
        let terms: Vec<Arc<[u8]>> = unique.iter().map(|t| Arc::from(t.as_slice())).collect();

        let mut present = BitVec::from_elem(sparse.len(), false);
        let mut ords = Vec::with_capacity(sparse.len());
        for (doc, value) in sparse.iter().enumerate() {
            match value {
                Some(term) => {
                    present.set(doc, true);
                    let ord = terms
                        .binary_search_by(|probe| probe.as_ref().cmp(term.as_slice()))
                        .expect("term present in dictionary");
                    ords.push(ord as i64);
                }
                None => ords.push(-1),
            }
        }
        let all_present = present.all();
        SortedColumn {
            ords,
            terms,
            present,
            all_present,
        }
    }
}

impl SortedValues for SortedColumn {
    fn ord(&self, doc: u32) -> i64 {
        self.ords.get(doc as usize).copied().unwrap_or(-1)
    }

    fn value_count(&self) -> i64 {
        self.terms.len() as i64
    }

    fn lookup_ord(&self, ord: i64) -> Arc<[u8]> {
        self.terms[usize::try_from(ord).expect("valid ordinal")].clone()
    }

    fn lookup_term(&self, key: &[u8]) -> i64 {
        match self.terms.binary_search_by(|probe| probe.as_ref().cmp(key)) {
            Ok(ord) => ord as i64,
            Err(insertion_point) => -(insertion_point as i64) - 1,
        }
    }
}

impl ExistenceBits for SortedColumn {
    fn has(&self, doc: u32) -> bool {
        self.present.get(doc as usize).unwrap_or(false)
    }
}

/// Raw byte-value column.
#[derive(Debug)]
struct BinaryColumn {
    values: Vec<Option<Arc<[u8]>>>,
    present: BitVec,
    all_present: bool,
}

impl BinaryColumn {
    fn from_sparse(sparse: Vec<Option<Vec<u8>>>) -> Self {
        let mut present = BitVec::from_elem(sparse.len(), false);
        let mut values = Vec::with_capacity(sparse.len());
        for (doc, value) in sparse.into_iter().enumerate() {
            match value {
                Some(bytes) => {
                    present.set(doc, true);
                    values.push(Some(Arc::from(bytes.as_slice())));
                }
                None => values.push(None),
            }
        }
        let all_present = present.all();
        BinaryColumn {
            values,
            present,
            all_present,
        }
    }
}

impl BinaryValues for BinaryColumn {
    fn get(&self, doc: u32) -> Option<Arc<[u8]>> {
        self.values.get(doc as usize).and_then(|v| v.clone())
    }
}

impl ExistenceBits for BinaryColumn {
    fn has(&self, doc: u32) -> bool {
        self.present.get(doc as usize).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_column_roundtrip() {
        let mut builder = MemorySegmentBuilder::new(4);
        builder.set_i64("year", 0, 2023).unwrap();
        builder.set_i64("year", 1, 2024).unwrap();
        builder.set_i64("year", 3, 1999).unwrap();
        let segment = builder.build();

        let years = segment.numeric_i64("year").unwrap();
        assert_eq!(years.get(0), 2023);
        assert_eq!(years.get(1), 2024);
        assert_eq!(years.get(2), 0); // missing reads as zero
        assert_eq!(years.get(3), 1999);

        let bits = segment.existence_bits("year").unwrap().unwrap();
        assert!(bits.has(0));
        assert!(!bits.has(2));
    }

    #[test]
    fn test_existence_bits_elided_when_all_present() {
        let mut builder = MemorySegmentBuilder::new(2);
        builder.set_f64("rating", 0, 4.5).unwrap();
        builder.set_f64("rating", 1, 5.0).unwrap();
        let segment = builder.build();

        assert!(segment.existence_bits("rating").unwrap().is_none());
    }

    #[test]
    fn test_sorted_column_ordinals() {
        let mut builder = MemorySegmentBuilder::new(4);
        builder.set_str("title", 0, "cherry").unwrap();
        builder.set_str("title", 1, "apple").unwrap();
        builder.set_str("title", 3, "banana").unwrap();
        let segment = builder.build();

        let sorted = segment.sorted("title").unwrap();
        assert_eq!(sorted.value_count(), 3);
        assert_eq!(sorted.ord(1), 0); // apple
        assert_eq!(sorted.ord(3), 1); // banana
        assert_eq!(sorted.ord(0), 2); // cherry
        assert_eq!(sorted.ord(2), -1); // missing

        assert_eq!(sorted.lookup_ord(0).as_ref(), b"apple");
        assert_eq!(sorted.lookup_term(b"banana"), 1);
        // "blueberry" would insert between banana (1) and cherry (2).
        assert_eq!(sorted.lookup_term(b"blueberry"), -3);
    }

    #[test]
    fn test_binary_column_empty_vs_missing() {
        let mut builder = MemorySegmentBuilder::new(2);
        builder.set_bytes("payload", 0, b"").unwrap();
        let segment = builder.build();

        let binary = segment.binary("payload").unwrap();
        assert_eq!(binary.get(0).unwrap().len(), 0); // empty, but present
        assert!(binary.get(1).is_none()); // missing

        let bits = segment.existence_bits("payload").unwrap().unwrap();
        assert!(bits.has(0));
        assert!(!bits.has(1));
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let mut builder = MemorySegmentBuilder::new(1);
        builder.set_i64("year", 0, 2023).unwrap();
        assert!(builder.set_str("year", 0, "oops").is_err());

        let segment = builder.build();
        assert!(segment.numeric_f32("year").is_err());
        assert!(segment.sorted("year").is_err());
        assert!(segment.numeric_i64("unknown").is_err());
    }
}
