//! Lifecycle and public surface of the row engine.
//!
//! A [`FileEngine`] moves through three states:
//!
//! ```text
//!            open()                 build_index() / load_index()
//!  Closed ───────────▶ Open ─────────────────────────────▶ Indexed
//!    ▲                  │ ▲                                   │
//!    └──── close() ─────┘ └──────────── rewind() ─────────────┘
//! ```
//!
//! While open the engine holds two things on the same file: a line stream for sequential
//! reads and a positioned-read handle for random access. `rewind` replaces the stream but
//! keeps the handle. Indexing happens at most once per engine and survives `close`/`open`.
//!
//! # Examples
//!
//! ```no_run
//! use rowseek::{BuildOptions, FileEngine};
//!
//! #[tokio::main]
//! async fn main() -> rowseek::Result<()> {
//!     let mut engine = FileEngine::new("events.csv");
//!     engine.open().await?;
//!     engine.build_index(BuildOptions::default()).await?;
//!
//!     println!("{} rows, {} columns", engine.lines()?, engine.columns()?);
//!     let row = engine.get_line(42).await?;
//!     println!("{}", row);
//!     Ok(())
//! }
//! ```

use tracing::{debug, info, warn};
use crate::errors::{EngineError, Result};
use crate::index_structure::persisted_index;
use crate::index_structure::row_index::RowIndex;
use crate::reading::index_builder;
use crate::reading::line_stream::LineStream;
use crate::reading::options::{BuildOptions, CloseOptions, EngineOptions};
use crate::reading::random_access;
use crate::reading::read_handle::ReadHandle;
use crate::reading::row_iterator::RowIterator;
use crate::reading::row_record::RowRecord;
use crate::row_shred::decode_row;
use crate::utils::header::Header;
use crate::utils::line_divisor::{detect_line_divisor, LineDivisor};

/// Lifecycle state reported by [`FileEngine::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Closed,
    Open,
    Indexed,
}

/// Indexed random-access and streaming reader for one delimited text file.
///
/// All operations take `&mut self`, so at most one operation (and at most one
/// [`RowIterator`] session) is in flight per engine.
pub struct FileEngine {
    filename: String,
    options: EngineOptions,
    line_divisor: Option<LineDivisor>,
    handle: Option<ReadHandle>,
    stream: Option<LineStream>,
    index: Option<RowIndex>,
    // Header captured by a sequential pass before any index exists
    stream_header: Option<Header>,
}

impl std::fmt::Debug for FileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEngine")
            .field("filename", &self.filename)
            .field("state", &self.state())
            .field("line_divisor", &self.line_divisor)
            .field("lines", &self.index.as_ref().map(|i| i.lines))
            .finish()
    }
}

impl FileEngine {
    /// Creates an unopened engine with default options. No I/O happens until [`open`](Self::open).
    pub fn new(filename: impl Into<String>) -> Self {
        Self::build(filename.into(), EngineOptions::default())
    }

    /// Creates an unopened engine with validated `options`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if the options are rejected.
    pub fn with_options(filename: impl Into<String>, options: EngineOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(filename.into(), options))
    }

    fn build(filename: String, options: EngineOptions) -> Self {
        Self {
            filename,
            line_divisor: options.line_divisor,
            options,
            handle: None,
            stream: None,
            index: None,
            stream_header: None,
        }
    }

    // ========== LIFECYCLE ==========

    /// Acquires the line stream and the positioned-read handle.
    ///
    /// On the first open the line divisor is sniffed from the leading `sniff_bytes` of the file
    /// unless one was configured. A handle kept by `close(preserve_handle)` is reused.
    ///
    /// # Errors
    ///
    /// * [`EngineError::State`] if already open
    /// * [`EngineError::Io`] if the file cannot be opened or read
    pub async fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(EngineError::state(format!("{} is already open", self.filename)));
        }

        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => ReadHandle::acquire(&self.filename).await?,
        };

        let opened = self.open_stream(&handle).await;
        // The handle is kept even if the stream failed, so a retry does not reacquire it
        self.handle = Some(handle);
        self.stream = Some(opened?);
        debug!(filename = self.filename.as_str(), "opened");
        Ok(())
    }

    async fn open_stream(&mut self, handle: &ReadHandle) -> Result<LineStream> {
        let divisor = match self.line_divisor {
            Some(divisor) => divisor,
            None => {
                let sample = handle.read_range(0, self.options.sniff_bytes as u64).await
                    .map_err(|e| EngineError::io("open", &self.filename, e))?;
                let divisor = detect_line_divisor(&sample);
                debug!(filename = self.filename.as_str(), %divisor, "detected line divisor");
                self.line_divisor = Some(divisor);
                divisor
            }
        };
        let inner = handle.open_stream().await
            .map_err(|e| EngineError::io("open", &self.filename, e))?;
        Ok(LineStream::new(inner, divisor))
    }

    /// Releases the line stream, and the positioned-read handle unless `preserve_handle`.
    ///
    /// The index, if any, is kept.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::State`] if the engine is not open.
    pub fn close(&mut self, options: CloseOptions) -> Result<()> {
        if self.stream.take().is_none() {
            return Err(EngineError::state(format!("{} is not open", self.filename)));
        }
        if !options.preserve_handle {
            self.handle = None;
        }
        debug!(filename = self.filename.as_str(), preserve_handle = options.preserve_handle, "closed");
        Ok(())
    }

    /// Restarts sequential reading at the first data row, keeping the read handle.
    ///
    /// # Errors
    ///
    /// * [`EngineError::State`] if the engine is not open
    /// * [`EngineError::Io`] if the stream cannot be reopened
    pub async fn rewind(&mut self) -> Result<()> {
        self.close(CloseOptions { preserve_handle: true })?;
        self.open().await
    }

    // ========== INDEXING ==========

    /// Scans the file once and builds the row index.
    ///
    /// The first line becomes the header and every following line one index entry. With
    /// `options.max` the scan stops after that many data rows. Afterwards the stream is rewound
    /// so sequential reads start fresh.
    ///
    /// # Errors
    ///
    /// * [`EngineError::State`] if the engine is not open or already indexed
    /// * [`EngineError::Io`] if the scan fails; the engine is rewound and stays unindexed
    pub async fn build_index(&mut self, options: BuildOptions<'_>) -> Result<()> {
        if self.index.is_some() {
            return Err(EngineError::state(format!("{} is already indexed", self.filename)));
        }
        let divisor = self.require_divisor()?;
        let BuildOptions { max, progress } = options;

        // A sequential pass may already be under way; the scan needs byte 0
        if self.stream.as_ref().is_some_and(|s| s.lines_read > 0) {
            self.rewind().await?;
        }
        let stream = self.stream.as_mut()
            .ok_or_else(|| EngineError::state(format!("{} is not open", self.filename)))?;

        info!(filename = self.filename.as_str(), ?max, "building row index");
        let scanned = index_builder::scan(
            stream,
            &self.filename,
            divisor,
            self.options.delimiter,
            max,
            progress,
        ).await;

        // Reset the stream whether or not the scan succeeded
        let reset = self.rewind().await;
        let index = match (scanned, reset) {
            (Ok(index), Ok(())) => index,
            (Err(e), reset) => {
                if let Err(reset_err) = reset {
                    warn!(filename = self.filename.as_str(), error = %reset_err, "could not reset stream after failed scan");
                }
                return Err(e);
            }
            (Ok(_), Err(e)) => return Err(e),
        };

        info!(
            filename = self.filename.as_str(),
            lines = index.lines,
            size = index.size,
            columns = index.columns(),
            max_row_length = index.max_row_length,
            "row index built"
        );
        self.index = Some(index);
        Ok(())
    }

    fn require_divisor(&self) -> Result<LineDivisor> {
        match (self.stream.is_some(), self.line_divisor) {
            (true, Some(divisor)) => Ok(divisor),
            _ => Err(EngineError::state(format!("{} is not open", self.filename))),
        }
    }

    fn require_open_indexed(&self) -> Result<(&ReadHandle, &RowIndex)> {
        let handle = match (&self.stream, &self.handle) {
            (Some(_), Some(handle)) => handle,
            _ => return Err(EngineError::state(format!("{} is not open", self.filename))),
        };
        let index = self.index.as_ref()
            .ok_or_else(|| EngineError::state(format!("{} is not indexed", self.filename)))?;
        Ok((handle, index))
    }

    // ========== RANDOM ACCESS ==========

    /// Reads data row `row` (1-based) through the index, without touching the stream.
    ///
    /// # Errors
    ///
    /// * [`EngineError::State`] if the engine is not open or not indexed
    /// * [`EngineError::Range`] if `row` is outside `[1, lines]`
    /// * [`EngineError::Io`] if the positioned read fails
    pub async fn get_line(&self, row: u64) -> Result<RowRecord> {
        let (handle, index) = self.require_open_indexed()?;
        let span = match index.span(row) {
            Some(span) if row <= index.lines => span,
            _ => return Err(EngineError::Range { row, lines: index.lines }),
        };
        random_access::read_row(handle, index, row, span, self.options.delimiter, &self.filename).await
    }

    /// Reads `count` consecutive rows starting at `first`.
    ///
    /// Neighbouring rows are fetched in coalesced reads of at most 8 MiB each. Every decoded
    /// row is returned in one vector, so memory grows with `count`; page through long runs in
    /// several calls or use [`iterator`](Self::iterator) instead.
    ///
    /// # Errors
    ///
    /// Same as [`get_line`](Self::get_line); the range error names the first missing row.
    pub async fn get_lines(&self, first: u64, count: u64) -> Result<Vec<RowRecord>> {
        let (handle, index) = self.require_open_indexed()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        if first == 0 {
            return Err(EngineError::Range { row: first, lines: index.lines });
        }
        let last = first.saturating_add(count - 1);
        if last > index.lines {
            return Err(EngineError::Range { row: (index.lines + 1).max(first), lines: index.lines });
        }
        random_access::read_rows(handle, index, first, count, self.options.delimiter, &self.filename).await
    }

    // ========== SEQUENTIAL ==========

    /// Starts (or resumes) a sequential session over the data rows.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::State`] if the engine is not open.
    pub fn iterator(&mut self) -> Result<RowIterator<'_>> {
        if self.stream.is_none() {
            return Err(EngineError::state(format!("{} is not open", self.filename)));
        }
        Ok(RowIterator::new(self))
    }

    pub(crate) fn sequential_rows_yielded(&self) -> u64 {
        self.stream.as_ref().map_or(0, |s| s.rows_yielded)
    }

    pub(crate) async fn next_sequential_row(&mut self) -> Result<Option<RowRecord>> {
        let stream = self.stream.as_mut()
            .ok_or_else(|| EngineError::state(format!("{} is not open", self.filename)))?;
        let delimiter = self.options.delimiter;

        if stream.lines_read == 0 {
            let header_line = stream.next_line().await
                .map_err(|e| EngineError::io("iterator", &self.filename, e))?;
            let Some(header_line) = header_line else {
                return Ok(None);
            };
            if self.index.is_none() && self.stream_header.is_none() {
                self.stream_header = Some(Header::from_line(header_line.trim(), delimiter));
            }
        }

        // A line that fails to decode is still consumed and keeps its row number
        let consumed = stream.lines_read;
        let next = stream.next_line().await;
        if stream.lines_read > consumed {
            stream.rows_yielded += 1;
        }
        let Some(line) = next.map_err(|e| EngineError::io("iterator", &self.filename, e))? else {
            return Ok(None);
        };
        let row = stream.rows_yielded;

        let header = match (&self.index, &self.stream_header) {
            (Some(index), _) => &index.header,
            (None, Some(header)) => header,
            (None, None) => {
                return Err(EngineError::state(format!(
                    "row {} of {} has no header to decode against; the header line could not be read",
                    row, self.filename
                )));
            }
        };
        Ok(Some(decode_row(line.trim(), row, header, delimiter)))
    }

    // ========== PERSISTED INDEX ==========

    /// Writes the index to `{filename}.index/` so later engines can [`load_index`](Self::load_index).
    ///
    /// # Errors
    ///
    /// * [`EngineError::State`] if the engine is not open or not indexed
    /// * [`EngineError::Io`] / [`EngineError::IndexFile`] if writing fails
    pub async fn save_index(&self, prefix: Option<&str>) -> Result<()> {
        let (handle, index) = self.require_open_indexed()?;
        let divisor = self.require_divisor()?;
        persisted_index::save_index(
            &self.filename,
            prefix,
            index,
            divisor,
            self.options.delimiter,
            &handle.stamp(),
        ).await
    }

    /// Installs a previously saved index instead of scanning.
    ///
    /// Returns `Ok(false)` when no index exists, or when it no longer matches the file (size,
    /// etag or last-modified changed) or was built with a different delimiter or divisor.
    ///
    /// # Errors
    ///
    /// * [`EngineError::State`] if the engine is not open or already indexed
    /// * [`EngineError::Io`] / [`EngineError::IndexFile`] if the index files cannot be read
    pub async fn load_index(&mut self, prefix: Option<&str>) -> Result<bool> {
        if self.index.is_some() {
            return Err(EngineError::state(format!("{} is already indexed", self.filename)));
        }
        let divisor = self.require_divisor()?;
        let Some(handle) = self.handle.as_ref() else {
            return Err(EngineError::state(format!("{} is not open", self.filename)));
        };

        let Some(persisted) = persisted_index::load_index_meta(&self.filename, prefix).await? else {
            return Ok(false);
        };
        if !persisted.is_current(&handle.stamp()) {
            info!(filename = self.filename.as_str(), "persisted index is out of date");
            return Ok(false);
        }
        if persisted.delimiter != self.options.delimiter || persisted.line_divisor != divisor {
            warn!(
                filename = self.filename.as_str(),
                delimiter = %persisted.delimiter,
                divisor = %persisted.line_divisor,
                "persisted index was built with different settings"
            );
            return Ok(false);
        }

        let persisted = persisted_index::load_offsets(&self.filename, prefix, persisted).await?;
        info!(filename = self.filename.as_str(), lines = persisted.index.lines, "loaded persisted row index");
        self.index = Some(persisted.index);
        Ok(true)
    }

    // ========== ACCESSORS ==========

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    pub fn state(&self) -> EngineState {
        match (self.stream.is_some(), self.index.is_some()) {
            (false, _) => EngineState::Closed,
            (true, false) => EngineState::Open,
            (true, true) => EngineState::Indexed,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Detected (or configured) line divisor; `None` before the first open.
    pub fn line_divisor(&self) -> Option<LineDivisor> {
        self.line_divisor
    }

    /// Size of the file as reported when the read handle was acquired.
    pub fn file_size(&self) -> Option<u64> {
        self.handle.as_ref().map(ReadHandle::file_size)
    }

    fn require_index(&self) -> Result<&RowIndex> {
        self.index.as_ref()
            .ok_or_else(|| EngineError::state(format!("{} is not indexed", self.filename)))
    }

    pub fn header(&self) -> Result<&Header> {
        Ok(&self.require_index()?.header)
    }

    pub fn lines(&self) -> Result<u64> {
        Ok(self.require_index()?.lines)
    }

    pub fn columns(&self) -> Result<usize> {
        Ok(self.require_index()?.columns())
    }

    pub fn size(&self) -> Result<u64> {
        Ok(self.require_index()?.size)
    }

    pub fn max_row_length(&self) -> Result<u32> {
        Ok(self.require_index()?.max_row_length)
    }

    /// Whether the index reached the end of the file; `false` after a capped `build_index`.
    pub fn index_complete(&self) -> Result<bool> {
        Ok(self.require_index()?.complete)
    }
}
