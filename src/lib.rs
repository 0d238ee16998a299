//! Rowseek - Indexed Random Access for Large Delimited Text Files
//!
//! Reads CSV-like files that are too large to load into memory. One forward scan records the
//! byte offset and length of every data row; after that any row can be fetched with a single
//! positioned read, while a streaming iterator still walks the file in order. Works with local
//! files, S3 objects and in-process `memory://` files.
//!
//! # Overview
//!
//! This library provides:
//! - **One-pass indexing**: header, row count, byte size and a 12-byte offset entry per row
//! - **Random access**: `get_line(n)` reads exactly one row, independent of file size
//! - **Streaming**: an order-preserving iterator that needs no index
//! - **Lenient decoding**: rows with too many or too few cells are kept and flagged
//! - **Persisted indexes**: save the offset table next to the file and reuse it while the file
//!   is unchanged
//!
//! # Quick Start
//!
//! ```no_run
//! use rowseek::{BuildOptions, FileEngine};
//!
//! #[tokio::main]
//! async fn main() -> rowseek::Result<()> {
//!     let mut engine = FileEngine::new("events.csv");
//!     engine.open().await?;
//!
//!     // Reuse a saved index when it is still current, otherwise scan once
//!     if !engine.load_index(None).await? {
//!         engine.build_index(BuildOptions::default()).await?;
//!         engine.save_index(None).await?;
//!     }
//!
//!     let row = engine.get_line(1_000_000).await?;
//!     println!("{:?}", row.value("user_id"));
//!     Ok(())
//! }
//! ```
//!
//! # Limitations
//!
//! - No quoting or escaping: a delimiter inside a cell always splits it
//! - One line divisor per file, detected from the first line; mixed `\n`/`\r\n` files misalign
//!   random access after the first mismatching row
pub mod errors;
pub mod index_structure;
pub mod reading;
pub mod row_shred;
#[cfg(test)]
mod unit_tests;
pub mod utils;

use tracing::info;
use crate::index_structure::index_files::{index_file_path, IndexFile};
use crate::index_structure::persisted_index::load_index_meta;
use crate::reading::read_handle::ReadHandle;
use crate::utils::file_interaction_local_and_cloud::get_object_store;

pub use crate::errors::{EngineError, Result};
pub use crate::reading::file_engine::{EngineState, FileEngine};
pub use crate::reading::options::{BuildOptions, CloseOptions, EngineOptions};
pub use crate::reading::row_iterator::RowIterator;
pub use crate::reading::row_record::{FieldValue, RowRecord};
pub use crate::utils::header::Header;
pub use crate::utils::line_divisor::LineDivisor;
pub use crate::utils::progress::ProgressObserver;

// ============================================================================
// Public Types
// ============================================================================

/// Information about a persisted row index.
///
/// # Examples
///
/// ```no_run
/// use rowseek::get_index_info;
///
/// #[tokio::main]
/// async fn main() -> rowseek::Result<()> {
///     let info = get_index_info("events.csv", None).await?;
///     println!("{} rows across {} columns", info.lines, info.num_columns);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct IndexInfo {
    /// Index format version
    pub version: u32,

    /// Source file validation data
    pub source_etag: String,
    pub source_size: u64,
    pub source_last_modified: u64,

    /// Settings the index was built with
    pub line_divisor: LineDivisor,
    pub delimiter: char,

    /// Column information
    pub num_columns: usize,
    pub columns: Vec<String>,

    /// Row statistics
    pub lines: u64,
    pub size: u64,
    pub max_row_length: u32,
    /// False when the index was built with a row cap and may not cover the whole file
    pub complete: bool,

    /// Index file sizes (in bytes)
    pub meta_size: u64,
    pub offsets_size: u64,
    pub total_size: u64,
}

// ============================================================================
// Index Helpers
// ============================================================================

/// Builds the row index of `source_path` and saves it under `{source_path}.index/`.
///
/// Any previous index with the same prefix is overwritten.
///
/// # Errors
///
/// Returns an error if the options are invalid, the file cannot be read, or the index files
/// cannot be written.
pub async fn build_and_save_index(
    source_path: &str,
    options: EngineOptions,
    build: BuildOptions<'_>,
    index_file_prefix: Option<&str>,
) -> Result<IndexInfo> {
    let mut engine = FileEngine::with_options(source_path, options)?;
    engine.open().await?;
    engine.build_index(build).await?;
    engine.save_index(index_file_prefix).await?;
    engine.close(CloseOptions::default())?;

    let info = get_index_info(source_path, index_file_prefix).await?;
    info!(
        source = source_path,
        rows = info.lines,
        index_bytes = info.total_size,
        "index created"
    );
    Ok(info)
}

/// Get comprehensive information about a persisted index.
///
/// Reads only the metadata archive and the sizes of both index files; the offsets table is not
/// loaded.
///
/// # Arguments
///
/// * `source_path` - Path to the source file (index is at `{source_path}.index`)
/// * `index_file_prefix` - Optional prefix for index files (e.g., "v2_")
///
/// # Errors
///
/// Returns [`EngineError::IndexFile`] if no index exists or it cannot be decoded, and
/// [`EngineError::Io`] if an index file cannot be inspected.
pub async fn get_index_info(
    source_path: &str,
    index_file_prefix: Option<&str>,
) -> Result<IndexInfo> {
    let Some(persisted) = load_index_meta(source_path, index_file_prefix).await? else {
        return Err(EngineError::IndexFile(format!("No index found for '{}'", source_path)));
    };

    let meta_size = index_file_size(source_path, IndexFile::Meta, index_file_prefix).await?;
    let offsets_size = index_file_size(source_path, IndexFile::Offsets, index_file_prefix).await?;

    let index = persisted.index;
    Ok(IndexInfo {
        version: persisted.version,
        source_etag: persisted.stamp.etag,
        source_size: persisted.stamp.size,
        source_last_modified: persisted.stamp.last_modified,
        line_divisor: persisted.line_divisor,
        delimiter: persisted.delimiter,
        num_columns: index.columns(),
        columns: index.header.names,
        lines: index.lines,
        size: index.size,
        max_row_length: index.max_row_length,
        complete: index.complete,
        meta_size,
        offsets_size,
        total_size: meta_size + offsets_size,
    })
}

async fn index_file_size(source_path: &str, file_type: IndexFile, prefix: Option<&str>) -> Result<u64> {
    let path = index_file_path(source_path, file_type, prefix);
    let (store, obj_path) = get_object_store(&path).await
        .map_err(|e| EngineError::io("index_info", &path, e))?;
    let meta = store.head(&obj_path).await
        .map_err(|e| EngineError::io("index_info", &path, e))?;
    Ok(meta.size)
}

/// Checks that a persisted index exists and still matches its source file.
///
/// # Returns
/// * `Ok(true)` - Index exists and the source size, etag and last-modified time are unchanged
/// * `Ok(false)` - Index doesn't exist or is out of date
/// * `Err(...)` - The index or the source file could not be read
///
/// # Example
/// ```no_run
/// # async fn example() -> rowseek::Result<()> {
/// if rowseek::validate_index("events.csv", None).await? {
///     println!("Index is up to date");
/// } else {
///     println!("Index needs to be rebuilt");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn validate_index(source_path: &str, index_file_prefix: Option<&str>) -> Result<bool> {
    let Some(persisted) = load_index_meta(source_path, index_file_prefix).await? else {
        return Ok(false);
    };
    let handle = ReadHandle::acquire(source_path).await?;
    Ok(persisted.is_current(&handle.stamp()))
}

/// Check if an index exists for the source file.
///
/// Only looks for the metadata file; use [`validate_index`] to check it is current.
pub async fn index_exists(source_path: &str, index_file_prefix: Option<&str>) -> bool {
    let meta_path = index_file_path(source_path, IndexFile::Meta, index_file_prefix);
    match get_object_store(&meta_path).await {
        Ok((store, path)) => store.head(&path).await.is_ok(),
        Err(_) => false,
    }
}

/// Reads one row, using the persisted index when it is current and scanning otherwise.
///
/// A scanned index is kept in memory only.
///
/// # Errors
///
/// Returns [`EngineError::Range`] if `row` is outside `[1, lines]`, and the usual I/O and index
/// errors otherwise.
pub async fn read_row(
    source_path: &str,
    row: u64,
    options: EngineOptions,
    index_file_prefix: Option<&str>,
) -> Result<RowRecord> {
    let mut engine = FileEngine::with_options(source_path, options)?;
    engine.open().await?;
    if !engine.load_index(index_file_prefix).await? {
        engine.build_index(BuildOptions::default()).await?;
    }
    engine.get_line(row).await
}
