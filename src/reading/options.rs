use crate::errors::{EngineError, Result};
use crate::row_shred::DEFAULT_DELIMITER;
use crate::utils::line_divisor::{LineDivisor, DEFAULT_SNIFF_BYTES};
use crate::utils::progress::ProgressObserver;

/// Engine configuration, validated once when the engine is created.
///
/// # Examples
///
/// ```
/// # use rowseek::EngineOptions;
/// let options = EngineOptions { delimiter: ';', ..Default::default() };
/// assert!(options.validate().is_ok());
///
/// let bad = EngineOptions { delimiter: '\n', ..Default::default() };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Cell delimiter (default `,`).
    pub delimiter: char,
    /// Leading bytes inspected to detect the line divisor (default 8 KiB).
    pub sniff_bytes: usize,
    /// Fixed line divisor; `None` detects it on first open.
    pub line_divisor: Option<LineDivisor>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            sniff_bytes: DEFAULT_SNIFF_BYTES,
            line_divisor: None,
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<()> {
        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(EngineError::InvalidArgument(format!(
                "delimiter {:?} collides with the line divisor",
                self.delimiter
            )));
        }
        if self.sniff_bytes == 0 {
            return Err(EngineError::InvalidArgument(
                "sniff_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for [`FileEngine::close`](crate::FileEngine::close).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseOptions {
    /// Keep the positioned-read handle so the next `open` does not reacquire it.
    pub preserve_handle: bool,
}

/// Options for [`FileEngine::build_index`](crate::FileEngine::build_index).
#[derive(Default)]
pub struct BuildOptions<'a> {
    /// Stop after this many data rows; `None` scans the whole file.
    pub max: Option<u64>,
    /// Called once per indexed row with the row count when `max` is set, otherwise with the
    /// cumulative byte count.
    pub progress: Option<&'a mut dyn ProgressObserver>,
}

impl<'a> BuildOptions<'a> {
    pub fn with_max(max: u64) -> Self {
        Self {
            max: Some(max),
            progress: None,
        }
    }

    pub fn progress(mut self, observer: &'a mut dyn ProgressObserver) -> Self {
        self.progress = Some(observer);
        self
    }
}

impl std::fmt::Debug for BuildOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("max", &self.max)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
