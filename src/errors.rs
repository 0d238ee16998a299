use thiserror::Error;

/// Name used as the first element of every I/O error context.
pub const ENGINE_NAME: &str = "FileEngine";

/// Error type for every fallible operation in this crate.
///
/// The variants mirror the three ways a call on a [`FileEngine`](crate::FileEngine) can fail:
/// being issued in the wrong lifecycle state, asking for a row that does not exist, or hitting
/// an I/O failure underneath. Two further variants cover option validation and the persisted
/// index files.
///
/// No variant is retried internally. A failed call leaves the engine in the state it was in
/// before the call, so a failed `get_line` does not drop the index.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Operation invoked in an invalid lifecycle state (double open, close while closed,
    /// indexing required but absent, accessor used before indexing).
    #[error("State error: {0}")]
    State(String),

    /// Row number outside `[1, lines]` or without an index table entry.
    #[error("Range error: row {row} is outside 1..={lines}")]
    Range { row: u64, lines: u64 },

    /// Underlying open/read/positioned-read failure, with the operation and file that failed.
    #[error("{engine}.{operation}({filename}): {source}")]
    Io {
        engine: &'static str,
        operation: &'static str,
        filename: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Rejected engine options or CLI argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Persisted index could not be serialized or deserialized.
    #[error("Index file error: {0}")]
    IndexFile(String),
}

impl EngineError {
    pub(crate) fn state(message: impl Into<String>) -> Self {
        EngineError::State(message.into())
    }

    /// Wraps an underlying failure with the engine operation and file name.
    pub(crate) fn io<E>(operation: &'static str, filename: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        EngineError::Io {
            engine: ENGINE_NAME,
            operation,
            filename: filename.to_string(),
            source: source.into(),
        }
    }

    pub fn is_state(&self) -> bool {
        matches!(self, EngineError::State(_))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, EngineError::Range { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, EngineError::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
