use std::sync::Arc;
use bytes::Bytes;
use futures::stream::BoxStream;
use object_store::{ObjectMeta, ObjectStore, path::Path as ObjectPath};
use crate::errors::{EngineError, Result};
use crate::index_structure::persisted_index::SourceStamp;
use crate::utils::file_interaction_local_and_cloud::get_object_store;

/// Positioned-read handle on one file.
///
/// Holds the resolved store, the object path and the metadata captured when the handle was
/// acquired. The engine keeps it across `rewind` so the store is resolved once per file.
#[derive(Debug, Clone)]
pub(crate) struct ReadHandle {
    store: Arc<dyn ObjectStore>,
    path: ObjectPath,
    meta: ObjectMeta,
}

impl ReadHandle {
    pub(crate) async fn acquire(filename: &str) -> Result<Self> {
        let (store, path) = get_object_store(filename).await
            .map_err(|e| EngineError::io("open", filename, e))?;
        let meta = store.head(&path).await
            .map_err(|e| EngineError::io("open", filename, e))?;
        Ok(Self { store, path, meta })
    }

    pub(crate) fn file_size(&self) -> u64 {
        self.meta.size
    }

    pub(crate) fn stamp(&self) -> SourceStamp {
        SourceStamp::from(&self.meta)
    }

    /// Reads `[offset, offset + length)`, clamped to the end of the file.
    ///
    /// The final row of a file without a trailing divisor is indexed as if the divisor were
    /// present, so its span runs past the end by the divisor length.
    pub(crate) async fn read_range(&self, offset: u64, length: u64) -> object_store::Result<Bytes> {
        let end = offset.saturating_add(length).min(self.meta.size);
        if end <= offset {
            return Ok(Bytes::new());
        }
        self.store.get_range(&self.path, offset..end).await
    }

    /// Starts a fresh sequential read from byte 0.
    pub(crate) async fn open_stream(&self) -> object_store::Result<BoxStream<'static, object_store::Result<Bytes>>> {
        let result = self.store.get(&self.path).await?;
        Ok(result.into_stream())
    }
}
