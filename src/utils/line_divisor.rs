//! Line divisor detection.
//!
//! A file is assumed to end every line with the same byte sequence. The divisor is sniffed once
//! from a leading sample and then used for all offset bookkeeping, so a file that mixes `\n` and
//! `\r\n` will have every offset after the first mismatch shifted. That limitation is kept on
//! purpose; nothing downstream tries to repair it.

/// Default number of leading bytes inspected when sniffing the divisor (8 KiB).
pub const DEFAULT_SNIFF_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineDivisor {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineDivisor {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineDivisor::Lf => b"\n",
            LineDivisor::CrLf => b"\r\n",
        }
    }

    /// Byte length added to every row's text length in the index table.
    pub fn byte_len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    /// Stable tag used in persisted indexes.
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            LineDivisor::Lf => 0,
            LineDivisor::CrLf => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(LineDivisor::Lf),
            1 => Some(LineDivisor::CrLf),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineDivisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineDivisor::Lf => write!(f, "\\n"),
            LineDivisor::CrLf => write!(f, "\\r\\n"),
        }
    }
}

/// Detects the divisor from a leading sample of the file.
///
/// The first `\n` in the sample decides: preceded by `\r` means [`LineDivisor::CrLf`],
/// otherwise [`LineDivisor::Lf`]. A sample with no newline at all (a single-line file, or a
/// first line longer than the sample) falls back to `Lf`.
///
/// # Examples
///
/// ```
/// # use rowseek::utils::line_divisor::{detect_line_divisor, LineDivisor};
/// assert_eq!(detect_line_divisor(b"a,b\r\n1,2\r\n"), LineDivisor::CrLf);
/// assert_eq!(detect_line_divisor(b"a,b\n1,2\n"), LineDivisor::Lf);
/// assert_eq!(detect_line_divisor(b"a,b"), LineDivisor::Lf);
/// ```
pub fn detect_line_divisor(sample: &[u8]) -> LineDivisor {
    match sample.iter().position(|&b| b == b'\n') {
        Some(pos) if pos > 0 && sample[pos - 1] == b'\r' => LineDivisor::CrLf,
        _ => LineDivisor::Lf,
    }
}
