//! Pure data structures for decoded rows.
//!
//! A [`RowRecord`] is what both read paths hand back for one data line. It carries no logic
//! beyond accessors; decoding lives in [`crate::row_shred`].
//!
//! ```text
//! RowRecord
//! ├── index: u64                    (1-based, header excluded)
//! ├── line: Option<String>          (None when built from cells)
//! ├── cells: Vec<Option<String>>
//! ├── fields: IndexMap<String, FieldValue>
//! │   └── Single(Option<String>) | Multiple([Option<String>])
//! ├── unnamed: Vec<Option<String>>  (cells beyond the header width)
//! ├── has_missing_cells: bool
//! └── has_excess_cells: bool
//! ```

use indexmap::IndexMap;
use smallvec::{SmallVec, smallvec};

/// Value of one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Column name assigned once.
    Single(Option<String>),
    /// Column name assigned more than once (duplicate header name), in encounter order.
    Multiple(SmallVec<[Option<String>; 2]>),
}

impl FieldValue {
    /// Adds another value for the same name, turning a single value into a sequence.
    pub(crate) fn push(&mut self, value: Option<String>) {
        match self {
            FieldValue::Single(existing) => {
                let first = existing.take();
                *self = FieldValue::Multiple(smallvec![first, value]);
            }
            FieldValue::Multiple(values) => values.push(value),
        }
    }

    /// First assigned value, or `None` if it was null.
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Single(value) => value.as_deref(),
            FieldValue::Multiple(values) => values.first().and_then(|v| v.as_deref()),
        }
    }

    /// All assigned values in encounter order.
    pub fn values(&self) -> Vec<Option<&str>> {
        match self {
            FieldValue::Single(value) => vec![value.as_deref()],
            FieldValue::Multiple(values) => values.iter().map(|v| v.as_deref()).collect(),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, FieldValue::Multiple(_))
    }
}

/// One decoded data line.
///
/// `fields` always holds every header column name as a key, in header order. `unnamed` is
/// non-empty exactly when `has_excess_cells` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub index: u64,
    pub line: Option<String>,
    pub cells: Vec<Option<String>>,
    pub fields: IndexMap<String, FieldValue>,
    pub unnamed: Vec<Option<String>>,
    pub has_missing_cells: bool,
    pub has_excess_cells: bool,
}

impl RowRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// First value of a named field; `None` both for unknown names and for null values.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::first)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl std::fmt::Display for RowRecord {
    /// Formats the record as `#index {name: value, ...}` followed by unnamed cells, if any.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {{", self.index)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                FieldValue::Single(Some(v)) => write!(f, "{}: \"{}\"", name, v)?,
                FieldValue::Single(None) => write!(f, "{}: null", name)?,
                FieldValue::Multiple(values) => write!(f, "{}: {:?}", name, values)?,
            }
        }
        write!(f, "}}")?;
        if !self.unnamed.is_empty() {
            write!(f, " + {:?}", self.unnamed)?;
        }
        Ok(())
    }
}
