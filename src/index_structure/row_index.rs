use crate::index_structure::index_table::{IndexTable, RowSpan};
use crate::utils::header::Header;

/// Everything an index scan establishes about a file.
///
/// `lines` always equals `table.len()`; `size` is the byte size of the header line plus every
/// indexed row, each including its divisor. `complete` is false when the scan stopped at a row
/// cap, in which case the file may hold more rows than `lines`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndex {
    pub header: Header,
    pub table: IndexTable,
    pub lines: u64,
    pub size: u64,
    pub max_row_length: u32,
    pub complete: bool,
}

impl RowIndex {
    pub fn columns(&self) -> usize {
        self.header.len()
    }

    pub fn span(&self, row: u64) -> Option<RowSpan> {
        self.table.get(row)
    }

    /// Byte range covering rows `first..first + count`, or `None` if any row is missing.
    pub(crate) fn coalesced_range(&self, first: u64, count: u64) -> Option<(u64, u64)> {
        if count == 0 {
            return None;
        }
        let start = self.table.get(first)?;
        let end = self.table.get(first.checked_add(count - 1)?)?;
        Some((start.offset, end.end()))
    }
}
