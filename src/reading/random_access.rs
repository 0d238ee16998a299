//! Offset-based row reads.
//!
//! Every call reads into its own `Bytes`, so two reads never share a buffer. Decoded text is
//! trimmed before it reaches the row decoder, exactly like the sequential path.

use bytes::Bytes;
use crate::errors::{EngineError, Result};
use crate::index_structure::index_table::RowSpan;
use crate::index_structure::row_index::RowIndex;
use crate::reading::read_handle::ReadHandle;
use crate::reading::row_record::RowRecord;
use crate::row_shred::decode_row;

fn decode_text<'a>(bytes: &'a [u8], filename: &str, row: u64) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| EngineError::io("get_line", filename, format!("row {} is not valid UTF-8: {}", row, e)))
}

/// Reads and decodes one row.
pub(crate) async fn read_row(
    handle: &ReadHandle,
    index: &RowIndex,
    row: u64,
    span: RowSpan,
    delimiter: char,
    filename: &str,
) -> Result<RowRecord> {
    let bytes = handle.read_range(span.offset, span.length as u64).await
        .map_err(|e| EngineError::io("get_line", filename, e))?;
    let text = decode_text(&bytes, filename, row)?;
    Ok(decode_row(text.trim(), row, &index.header, delimiter))
}

/// Upper bound on the bytes fetched by one positioned read in [`read_rows`].
pub(crate) const MAX_COALESCED_READ: u64 = 8 * 1024 * 1024;

/// Reads `count` consecutive rows starting at `first`.
///
/// Neighbouring rows are fetched together in reads of at most [`MAX_COALESCED_READ`] bytes. The
/// decoded rows are all returned at once, so the result still holds the whole run in memory.
/// The caller has already checked that every row in the run has a table entry.
pub(crate) async fn read_rows(
    handle: &ReadHandle,
    index: &RowIndex,
    first: u64,
    count: u64,
    delimiter: char,
    filename: &str,
) -> Result<Vec<RowRecord>> {
    read_rows_bounded(handle, index, first, count, delimiter, filename, MAX_COALESCED_READ).await
}

pub(crate) async fn read_rows_bounded(
    handle: &ReadHandle,
    index: &RowIndex,
    first: u64,
    count: u64,
    delimiter: char,
    filename: &str,
    max_chunk: u64,
) -> Result<Vec<RowRecord>> {
    let mut rows = Vec::with_capacity(count as usize);
    let end_row = first + count;
    let mut chunk_first = first;
    while chunk_first < end_row {
        let start = span_of(index, chunk_first)?.offset;
        // A single row larger than the cap is read on its own
        let mut chunk_end = chunk_first + 1;
        while chunk_end < end_row && span_of(index, chunk_end)?.end() - start <= max_chunk {
            chunk_end += 1;
        }
        read_chunk(handle, index, chunk_first, chunk_end - chunk_first, delimiter, filename, &mut rows).await?;
        chunk_first = chunk_end;
    }
    Ok(rows)
}

fn span_of(index: &RowIndex, row: u64) -> Result<RowSpan> {
    index.span(row).ok_or(EngineError::Range { row, lines: index.lines })
}

async fn read_chunk(
    handle: &ReadHandle,
    index: &RowIndex,
    first: u64,
    count: u64,
    delimiter: char,
    filename: &str,
    rows: &mut Vec<RowRecord>,
) -> Result<()> {
    let Some((start, end)) = index.coalesced_range(first, count) else {
        return Ok(());
    };
    let bytes: Bytes = handle.read_range(start, end - start).await
        .map_err(|e| EngineError::io("get_lines", filename, e))?;

    for row in first..first + count {
        let span = span_of(index, row)?;
        // Clamp: the last row's span may run past the end of the file
        let from = ((span.offset - start) as usize).min(bytes.len());
        let to = ((span.end() - start) as usize).min(bytes.len());
        let text = decode_text(&bytes[from..to], filename, row)?;
        rows.push(decode_row(text.trim(), row, &index.header, delimiter));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::file_interaction_local_and_cloud::register_memory_file;
    use crate::utils::header::Header;

    const SAMPLE: &str = "a,b\n1,2\n3,4,5\n6\n";

    async fn sample() -> (ReadHandle, RowIndex) {
        let path = "memory://random-access/sample.csv";
        register_memory_file(path, Bytes::from_static(SAMPLE.as_bytes())).await.unwrap();
        let handle = ReadHandle::acquire(path).await.unwrap();

        let mut index = RowIndex {
            header: Header::from_line("a,b", ','),
            ..Default::default()
        };
        index.table.push(RowSpan { offset: 4, length: 4 });
        index.table.push(RowSpan { offset: 8, length: 6 });
        index.table.push(RowSpan { offset: 14, length: 2 });
        index.lines = 3;
        index.size = SAMPLE.len() as u64;
        index.complete = true;
        (handle, index)
    }

    #[tokio::test]
    async fn test_small_chunks_match_single_reads() {
        let (handle, index) = sample().await;
        let mut single = Vec::new();
        for row in 1..=3 {
            let span = index.span(row).unwrap();
            single.push(read_row(&handle, &index, row, span, ',', "sample.csv").await.unwrap());
        }

        // 5 bytes fits no two neighbouring rows, and row 2 alone is larger
        for cap in [1, 5, 10, MAX_COALESCED_READ] {
            let rows = read_rows_bounded(&handle, &index, 1, 3, ',', "sample.csv", cap).await.unwrap();
            assert_eq!(rows, single, "cap {}", cap);
        }

        let tail = read_rows_bounded(&handle, &index, 2, 2, ',', "sample.csv", 5).await.unwrap();
        assert_eq!(tail, single[1..].to_vec());
    }

    #[tokio::test]
    async fn test_missing_row_is_a_range_error() {
        let (handle, index) = sample().await;
        let err = read_rows_bounded(&handle, &index, 3, 2, ',', "sample.csv", 5).await.unwrap_err();
        assert!(matches!(err, EngineError::Range { row: 4, lines: 3 }), "{}", err);
    }
}
