use indexmap::IndexMap;
use crate::reading::row_record::{FieldValue, RowRecord};
use crate::utils::header::Header;

/// Delimiter used when none is configured.
pub const DEFAULT_DELIMITER: char = ',';

/// Splits one raw line into cells on `delimiter`.
///
/// There is no quoting or escaping: every delimiter character separates two cells, so a cell
/// can never contain the delimiter. Adjacent delimiters produce empty cells, and an empty line
/// produces a single empty cell.
///
/// # Examples
///
/// ```
/// # use rowseek::row_shred::split_cells;
/// assert_eq!(split_cells("a,,c", ','), vec!["a", "", "c"]);
/// assert_eq!(split_cells("", ','), vec![""]);
/// ```
pub fn split_cells(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).collect()
}

/// Reassembles cells with `delimiter`; the inverse of [`split_cells`] for cells that do not
/// contain the delimiter.
///
/// ```
/// # use rowseek::row_shred::{join_cells, split_cells};
/// let line = "x,,z";
/// assert_eq!(join_cells(&split_cells(line, ','), ','), line);
/// ```
pub fn join_cells<S: AsRef<str>>(cells: &[S], delimiter: char) -> String {
    let mut out = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(cell.as_ref());
    }
    out
}

/// Empty cells and missing positions are both represented as null.
#[inline]
fn normalize_cell(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Decodes one raw line into a [`RowRecord`] against `header`.
///
/// This is the only decoding routine; the random-access and sequential read paths both call
/// it, which is what keeps `get_line(n)` and the n-th iterated row identical.
///
/// # Arguments
///
/// * `line` - Raw row text without its line divisor
/// * `index` - 1-based row number among data rows
/// * `header` - Column names the cells are assigned to, by position
/// * `delimiter` - Cell delimiter
///
/// # Column count mismatches
///
/// * More cells than columns: `has_excess_cells` is set and the extra cells go to `unnamed`
/// * Fewer cells than columns: `has_missing_cells` is set and the missing names map to null
///
/// # Examples
///
/// ```
/// # use rowseek::row_shred::decode_row;
/// # use rowseek::utils::header::Header;
/// let header = Header::from_line("a,b", ',');
/// let row = decode_row("3,4,5", 2, &header, ',');
/// assert!(row.has_excess_cells);
/// assert_eq!(row.value("a"), Some("3"));
/// assert_eq!(row.unnamed, vec![Some("5".to_string())]);
/// ```
pub fn decode_row(line: &str, index: u64, header: &Header, delimiter: char) -> RowRecord {
    let cells = split_cells(line, delimiter)
        .into_iter()
        .map(normalize_cell)
        .collect();
    assign_cells(index, Some(line.to_string()), cells, header)
}

/// Builds a [`RowRecord`] from cells that were not read from a line (`line` is `None`).
///
/// Empty strings are normalized to null the same way [`decode_row`] does.
pub fn decode_cells(cells: Vec<Option<String>>, index: u64, header: &Header) -> RowRecord {
    let cells = cells
        .into_iter()
        .map(|cell| cell.filter(|c| !c.is_empty()))
        .collect();
    assign_cells(index, None, cells, header)
}

fn assign_cells(
    index: u64,
    line: Option<String>,
    cells: Vec<Option<String>>,
    header: &Header,
) -> RowRecord {
    let columns = header.len();
    let mut fields: IndexMap<String, FieldValue> = IndexMap::with_capacity(columns);

    for (position, name) in header.iter().enumerate() {
        let value = cells.get(position).cloned().flatten();
        match fields.get_mut(name) {
            // Duplicate column name collects every value in encounter order
            Some(existing) => existing.push(value),
            None => {
                fields.insert(name.to_string(), FieldValue::Single(value));
            }
        }
    }

    let has_excess_cells = cells.len() > columns;
    let unnamed = if has_excess_cells {
        cells[columns..].to_vec()
    } else {
        Vec::new()
    };

    RowRecord {
        index,
        line,
        has_missing_cells: cells.len() < columns,
        has_excess_cells,
        cells,
        fields,
        unnamed,
    }
}

#[cfg(test)]
#[path = "row_shred/tests/mod.rs"]
mod tests;
