//! Saving and loading a [`RowIndex`] next to its source file.
//!
//! The metadata archive is read first and checked against the source's current size, etag and
//! last-modified time before the (much larger) offsets file is fetched. A stale index is never
//! installed.

use bytes::Bytes;
use object_store::{ObjectMeta, PutPayload};
use rkyv::{Archive, Archived, Serialize as RkyvSerialize, Deserialize as RkyvDeserialize, to_bytes};
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use tracing::{debug, info};
use crate::errors::{EngineError, Result};
use crate::index_structure::index_files::{index_file_path, IndexFile};
use crate::index_structure::index_table::IndexTable;
use crate::index_structure::row_index::RowIndex;
use crate::utils::file_interaction_local_and_cloud::get_object_store;
use crate::utils::header::Header;
use crate::utils::line_divisor::LineDivisor;

/// Format version written into every `meta.rkyv`.
pub const INDEX_VERSION: u32 = 1;

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct IndexMeta {
    // Version & validation
    pub version: u32,
    pub source_etag: String,
    pub source_size: u64,
    pub source_last_modified: u64,

    // Parsing configuration the offsets depend on
    pub line_divisor: u8,
    pub delimiter: u32,

    // Scan results
    pub header: Header,
    pub lines: u64,
    pub size: u64,
    pub max_row_length: u32,
    // False when the scan stopped at a row cap
    pub complete: bool,
}

/// Identity of the source file at the time an index was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStamp {
    pub size: u64,
    pub etag: String,
    pub last_modified: u64,
}

impl From<&ObjectMeta> for SourceStamp {
    fn from(meta: &ObjectMeta) -> Self {
        Self {
            size: meta.size,
            etag: meta.e_tag.clone().unwrap_or_default(),
            last_modified: meta.last_modified.timestamp() as u64,
        }
    }
}

/// A loaded index together with the settings it was built with.
#[derive(Debug, Clone)]
pub struct PersistedIndex {
    pub version: u32,
    pub stamp: SourceStamp,
    pub line_divisor: LineDivisor,
    pub delimiter: char,
    pub index: RowIndex,
}

impl PersistedIndex {
    /// Whether the source still matches what was indexed.
    ///
    /// Size and last-modified must match; the etag is only compared when both sides have one.
    pub fn is_current(&self, source: &SourceStamp) -> bool {
        if self.stamp.size != source.size {
            return false;
        }
        if !self.stamp.etag.is_empty() && !source.etag.is_empty() && self.stamp.etag != source.etag {
            return false;
        }
        self.stamp.last_modified == source.last_modified
    }
}

fn index_io_error(operation: &'static str, path: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> EngineError {
    EngineError::io(operation, path, source)
}

/// Writes `meta.rkyv` and `offsets.bin` under `{source_path}.index/`.
///
/// # Errors
///
/// * [`EngineError::IndexFile`] if the metadata cannot be serialized
/// * [`EngineError::Io`] if either file cannot be written
pub async fn save_index(
    source_path: &str,
    prefix: Option<&str>,
    index: &RowIndex,
    line_divisor: LineDivisor,
    delimiter: char,
    stamp: &SourceStamp,
) -> Result<()> {
    let meta = IndexMeta {
        version: INDEX_VERSION,
        source_etag: stamp.etag.clone(),
        source_size: stamp.size,
        source_last_modified: stamp.last_modified,
        line_divisor: line_divisor.to_tag(),
        delimiter: delimiter as u32,
        header: index.header.clone(),
        lines: index.lines,
        size: index.size,
        max_row_length: index.max_row_length,
        complete: index.complete,
    };

    let meta_bytes = to_bytes::<RkyvError>(&meta)
        .map_err(|e| EngineError::IndexFile(format!("Failed to serialize index metadata: {}", e)))?;
    let offsets_bytes = index.table.to_bytes();

    let meta_path = index_file_path(source_path, IndexFile::Meta, prefix);
    let offsets_path = index_file_path(source_path, IndexFile::Offsets, prefix);

    // Offsets first so a readable meta never points at a missing table
    let (store, obj_path) = get_object_store(&offsets_path).await
        .map_err(|e| index_io_error("save_index", &offsets_path, e))?;
    store.put(&obj_path, PutPayload::from_bytes(Bytes::from(offsets_bytes))).await
        .map_err(|e| index_io_error("save_index", &offsets_path, e))?;

    let (store, obj_path) = get_object_store(&meta_path).await
        .map_err(|e| index_io_error("save_index", &meta_path, e))?;
    store.put(&obj_path, PutPayload::from_bytes(Bytes::from(meta_bytes.to_vec()))).await
        .map_err(|e| index_io_error("save_index", &meta_path, e))?;

    info!(source = source_path, rows = index.lines, "saved row index");
    Ok(())
}

/// Reads an index file, mapping "not found" to `None`.
async fn read_index_file(path: &str) -> Result<Option<Bytes>> {
    let (store, obj_path) = get_object_store(path).await
        .map_err(|e| index_io_error("load_index", path, e))?;
    match store.get(&obj_path).await {
        Ok(result) => {
            let bytes = result.bytes().await
                .map_err(|e| index_io_error("load_index", path, e))?;
            Ok(Some(bytes))
        }
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(index_io_error("load_index", path, e)),
    }
}

/// Decodes `meta.rkyv` without reading the offsets.
pub fn decode_meta(bytes: &[u8]) -> Result<(u32, SourceStamp, LineDivisor, char, RowIndex)> {
    let mut aligned = AlignedVec::<16>::new();
    aligned.extend_from_slice(bytes);

    let archived: &Archived<IndexMeta> = rkyv::access(&aligned)
        .map_err(|e: RkyvError| EngineError::IndexFile(format!("Failed to access archived metadata: {}", e)))?;

    let version = archived.version.to_native();
    if version != INDEX_VERSION {
        return Err(EngineError::IndexFile(format!(
            "Unsupported index version {} (expected {})",
            version, INDEX_VERSION
        )));
    }

    let line_divisor = LineDivisor::from_tag(archived.line_divisor)
        .ok_or_else(|| EngineError::IndexFile(format!("Unknown line divisor tag {}", archived.line_divisor)))?;
    let delimiter = char::from_u32(archived.delimiter.to_native())
        .ok_or_else(|| EngineError::IndexFile("Invalid delimiter in index metadata".to_string()))?;

    let stamp = SourceStamp {
        size: archived.source_size.to_native(),
        etag: archived.source_etag.to_string(),
        last_modified: archived.source_last_modified.to_native(),
    };

    let index = RowIndex {
        header: Header::new(archived.header.names.iter().map(|s| s.to_string()).collect()),
        table: IndexTable::new(),
        lines: archived.lines.to_native(),
        size: archived.size.to_native(),
        max_row_length: archived.max_row_length.to_native(),
        complete: archived.complete,
    };

    Ok((version, stamp, line_divisor, delimiter, index))
}

/// Loads only the metadata of a persisted index; the returned table is empty.
pub async fn load_index_meta(source_path: &str, prefix: Option<&str>) -> Result<Option<PersistedIndex>> {
    let meta_path = index_file_path(source_path, IndexFile::Meta, prefix);
    let Some(meta_bytes) = read_index_file(&meta_path).await? else {
        debug!(path = meta_path.as_str(), "no persisted index");
        return Ok(None);
    };
    let (version, stamp, line_divisor, delimiter, index) = decode_meta(&meta_bytes)?;
    Ok(Some(PersistedIndex {
        version,
        stamp,
        line_divisor,
        delimiter,
        index,
    }))
}

/// Loads a complete persisted index, or `None` if none exists.
///
/// # Errors
///
/// * [`EngineError::IndexFile`] if either file is corrupt or the table length disagrees with
///   the recorded row count
/// * [`EngineError::Io`] on read failures other than "not found"
pub async fn load_index(source_path: &str, prefix: Option<&str>) -> Result<Option<PersistedIndex>> {
    match load_index_meta(source_path, prefix).await? {
        Some(persisted) => load_offsets(source_path, prefix, persisted).await.map(Some),
        None => Ok(None),
    }
}

/// Fills the row table of an index returned by [`load_index_meta`].
pub async fn load_offsets(
    source_path: &str,
    prefix: Option<&str>,
    mut persisted: PersistedIndex,
) -> Result<PersistedIndex> {
    let offsets_path = index_file_path(source_path, IndexFile::Offsets, prefix);
    let Some(offsets_bytes) = read_index_file(&offsets_path).await? else {
        return Err(EngineError::IndexFile(format!("{} is missing", offsets_path)));
    };
    let table = IndexTable::from_bytes(&offsets_bytes)?;
    if table.len() as u64 != persisted.index.lines {
        return Err(EngineError::IndexFile(format!(
            "offsets hold {} rows but metadata records {}",
            table.len(),
            persisted.index.lines
        )));
    }
    persisted.index.table = table;
    Ok(persisted)
}
