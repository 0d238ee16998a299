//! One-pass forward scan that builds a [`RowIndex`].
//!
//! The first line is the header: it is split into column names and counted toward `size`, but
//! it gets no table entry. Every following line gets `(running_size, text_len + divisor_len)`
//! before `running_size` advances by that same length.

use tracing::debug;
use crate::errors::{EngineError, Result};
use crate::index_structure::index_table::RowSpan;
use crate::index_structure::row_index::RowIndex;
use crate::reading::line_stream::LineStream;
use crate::utils::header::Header;
use crate::utils::line_divisor::LineDivisor;
use crate::utils::progress::ProgressObserver;

/// Scans `stream` from its current position, which must be the start of the file.
///
/// # Arguments
///
/// * `max` - Stop after this many data rows; `lines` and `size` then cover only those rows
/// * `progress` - Receives the row count (with `max`) or the cumulative byte count (without)
///
/// # Errors
///
/// Returns [`EngineError::Io`] if the stream fails or a row is longer than `u32::MAX` bytes.
pub(crate) async fn scan(
    stream: &mut LineStream,
    filename: &str,
    divisor: LineDivisor,
    delimiter: char,
    max: Option<u64>,
    mut progress: Option<&mut dyn ProgressObserver>,
) -> Result<RowIndex> {
    let divisor_len = divisor.byte_len();
    let mut index = RowIndex::default();

    let Some(header_line) = stream.next_line().await
        .map_err(|e| EngineError::io("build_index", filename, e))? else {
        debug!(filename, "empty file, nothing to index");
        index.complete = true;
        return Ok(index);
    };
    index.header = Header::from_line(header_line.trim(), delimiter);
    let mut running_size = header_line.len() as u64 + divisor_len;

    loop {
        if max.is_some_and(|max| index.lines >= max) {
            break;
        }
        let Some(line) = stream.next_line().await
            .map_err(|e| EngineError::io("build_index", filename, e))? else {
            index.complete = true;
            break;
        };

        let length = line.len() as u64 + divisor_len;
        let length = u32::try_from(length).map_err(|_| {
            EngineError::io(
                "build_index",
                filename,
                format!("row {} is {} bytes, longer than supported", index.lines + 1, length),
            )
        })?;

        index.table.push(RowSpan { offset: running_size, length });
        running_size += length as u64;
        index.lines += 1;
        index.max_row_length = index.max_row_length.max(length);

        if let Some(observer) = progress.as_deref_mut() {
            observer.report(if max.is_some() { index.lines } else { running_size });
        }
    }

    index.size = running_size;
    Ok(index)
}
