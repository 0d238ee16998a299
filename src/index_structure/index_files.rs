//! Index file management utilities.
//!
//! A persisted row index consists of two files stored in an `.index` directory alongside the
//! source file.
//!
//! # File Structure
//!
//! For a source file at `data/events.csv`, the index files are stored in:
//! ```text
//! data/events.csv.index/
//! ├── meta.rkyv          # Header, counts, divisor, source validation data
//! └── offsets.bin        # One (u64 offset, u32 length) entry per data row
//! ```
//!
//! # File Prefixes
//!
//! Index files can have optional prefixes for versioning or testing:
//! ```text
//! data/events.csv.index/
//! ├── v1_meta.rkyv
//! ├── v1_offsets.bin
//! ├── test_meta.rkyv
//! └── test_offsets.bin
//! ```

/// Types of files in a persisted index.
#[derive(Debug, Clone, Copy)]
pub enum IndexFile {
    /// Small rkyv archive read first: header, row count, byte size, line divisor, delimiter and
    /// the source size/etag/last-modified used to detect a stale index.
    Meta,

    /// Fixed-width little-endian row table, 12 bytes per data row.
    Offsets,
}

impl IndexFile {
    fn base_name(&self) -> &'static str {
        match self {
            IndexFile::Meta => "meta.rkyv",
            IndexFile::Offsets => "offsets.bin",
        }
    }
}

/// Creates an index filename with an optional prefix.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(index_filename(IndexFile::Meta, None), "meta.rkyv");
/// assert_eq!(index_filename(IndexFile::Offsets, Some("v2_")), "v2_offsets.bin");
/// ```
pub(crate) fn index_filename(file_type: IndexFile, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("{}{}", p, file_type.base_name()),
        None => file_type.base_name().to_string(),
    }
}

/// Full path of one index file for `source_path`.
pub(crate) fn index_file_path(source_path: &str, file_type: IndexFile, prefix: Option<&str>) -> String {
    format!("{}.index/{}", source_path, index_filename(file_type, prefix))
}
