//! Byte-offset table over the data rows of a file.
//!
//! Row `n` (1-based, header excluded) maps to the byte offset where its text starts and the
//! number of bytes it occupies including its line divisor. Offsets are measured from the start
//! of the file and accumulate across the header and every earlier row, so they are strictly
//! increasing.

use crate::errors::{EngineError, Result};

/// Size of one entry in `offsets.bin`: `u64` offset + `u32` length, little-endian.
pub const ENTRY_SIZE: usize = 12;

/// Location of one row inside the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub offset: u64,
    /// Row text length plus divisor length.
    pub length: u32,
}

impl RowSpan {
    pub fn end(&self) -> u64 {
        self.offset + self.length as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexTable {
    spans: Vec<RowSpan>,
}

impl IndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            spans: Vec::with_capacity(rows),
        }
    }

    /// Appends the next row. Rows must be pushed in file order.
    pub fn push(&mut self, span: RowSpan) {
        debug_assert!(
            self.spans.last().is_none_or(|last| last.offset < span.offset),
            "offsets must be strictly increasing"
        );
        self.spans.push(span);
    }

    /// Entry for 1-based `row`, or `None` for row 0 and rows past the end.
    pub fn get(&self, row: u64) -> Option<RowSpan> {
        if row == 0 {
            return None;
        }
        self.spans.get((row - 1) as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowSpan> {
        self.spans.iter()
    }

    /// Encodes the table as fixed-width little-endian entries.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.spans.len() * ENTRY_SIZE);
        for span in &self.spans {
            out.extend_from_slice(&span.offset.to_le_bytes());
            out.extend_from_slice(&span.length.to_le_bytes());
        }
        out
    }

    /// Decodes a table written by [`IndexTable::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::IndexFile`] if the byte length is not a whole number of entries
    /// or the offsets are not strictly increasing.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(EngineError::IndexFile(format!(
                "offsets length {} is not a multiple of {}",
                bytes.len(),
                ENTRY_SIZE
            )));
        }
        let mut table = Self::with_capacity(bytes.len() / ENTRY_SIZE);
        for chunk in bytes.chunks_exact(ENTRY_SIZE) {
            let mut offset = [0u8; 8];
            let mut length = [0u8; 4];
            offset.copy_from_slice(&chunk[..8]);
            length.copy_from_slice(&chunk[8..]);
            let span = RowSpan {
                offset: u64::from_le_bytes(offset),
                length: u32::from_le_bytes(length),
            };
            if table.spans.last().is_some_and(|last| last.offset >= span.offset) {
                return Err(EngineError::IndexFile(format!(
                    "offset {} out of order at row {}",
                    span.offset,
                    table.len() + 1
                )));
            }
            table.spans.push(span);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IndexTable {
        let mut table = IndexTable::new();
        table.push(RowSpan { offset: 4, length: 4 });
        table.push(RowSpan { offset: 8, length: 6 });
        table.push(RowSpan { offset: 14, length: 2 });
        table
    }

    #[test]
    fn test_one_based_lookup() {
        let table = sample();
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(1), Some(RowSpan { offset: 4, length: 4 }));
        assert_eq!(table.get(3).map(|s| s.end()), Some(16));
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn test_bytes_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), 3 * ENTRY_SIZE);
        assert_eq!(&bytes[..8], &4u64.to_le_bytes());
        assert_eq!(&bytes[8..12], &4u32.to_le_bytes());
        assert_eq!(IndexTable::from_bytes(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_from_bytes_rejects_truncated() {
        let mut bytes = sample().to_bytes();
        bytes.pop();
        assert!(matches!(IndexTable::from_bytes(&bytes), Err(EngineError::IndexFile(_))));
    }

    #[test]
    fn test_from_bytes_rejects_unordered() {
        let mut bytes = Vec::new();
        for offset in [10u64, 5] {
            bytes.extend_from_slice(&offset.to_le_bytes());
            bytes.extend_from_slice(&1u32.to_le_bytes());
        }
        let err = IndexTable::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("out of order at row 2"), "{}", err);
    }
}
