use bytes::{Buf, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use crate::utils::line_divisor::LineDivisor;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Line-oriented view over a byte stream.
///
/// Splits on `\n`; when the divisor is [`LineDivisor::CrLf`] a `\r` directly before the `\n` is
/// dropped as well. A final line without a trailing newline is still returned. The stream also
/// tracks how far the current pass has gone, so iterator sessions can tell whether the header
/// line has already been consumed.
pub(crate) struct LineStream {
    inner: BoxStream<'static, object_store::Result<bytes::Bytes>>,
    buffer: BytesMut,
    scanned: usize,
    finished: bool,
    divisor: LineDivisor,
    /// Physical lines returned so far in this pass (header included).
    pub(crate) lines_read: u64,
    /// Data rows handed out to iterator sessions in this pass.
    pub(crate) rows_yielded: u64,
}

impl LineStream {
    pub(crate) fn new(
        inner: BoxStream<'static, object_store::Result<bytes::Bytes>>,
        divisor: LineDivisor,
    ) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            scanned: 0,
            finished: false,
            divisor,
            lines_read: 0,
            rows_yielded: 0,
        }
    }

    /// Next line without its divisor, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Fails if the underlying read fails or the line is not valid UTF-8.
    pub(crate) async fn next_line(&mut self) -> Result<Option<String>, BoxError> {
        loop {
            if let Some(found) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
                let newline = self.scanned + found;
                let mut text_end = newline;
                if self.divisor == LineDivisor::CrLf && text_end > 0 && self.buffer[text_end - 1] == b'\r' {
                    text_end -= 1;
                }
                let line = self.buffer.split_to(newline + 1);
                self.scanned = 0;
                return self.emit(&line[..text_end]).map(Some);
            }
            self.scanned = self.buffer.len();

            if self.finished {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest = self.buffer.split();
                self.scanned = 0;
                return self.emit(rest.chunk()).map(Some);
            }

            match self.inner.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => self.finished = true,
            }
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<String, BoxError> {
        // The bytes are already out of the buffer, so the line counts even if it fails to decode
        self.lines_read += 1;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| format!("line {} is not valid UTF-8: {}", self.lines_read, e))?;
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    fn stream_of(chunks: &[&'static [u8]], divisor: LineDivisor) -> LineStream {
        let items: Vec<object_store::Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        LineStream::new(stream::iter(items).boxed(), divisor)
    }

    async fn drain(mut lines: LineStream) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn test_lines_across_chunk_boundaries() {
        let lines = stream_of(&[b"a,b\n1,", b"2\n3", b",4\n"], LineDivisor::Lf);
        assert_eq!(drain(lines).await, vec!["a,b", "1,2", "3,4"]);
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let lines = stream_of(&[b"a\nb"], LineDivisor::Lf);
        assert_eq!(drain(lines).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_crlf_stripped_only_for_crlf_divisor() {
        let crlf = stream_of(&[b"a\r\nb\r", b"\n"], LineDivisor::CrLf);
        assert_eq!(drain(crlf).await, vec!["a", "b"]);

        let lf = stream_of(&[b"a\r\nb\n"], LineDivisor::Lf);
        assert_eq!(drain(lf).await, vec!["a\r", "b"]);
    }

    #[tokio::test]
    async fn test_blank_lines_are_lines() {
        let lines = stream_of(&[b"h\n\n\nx\n"], LineDivisor::Lf);
        assert_eq!(drain(lines).await, vec!["h", "", "", "x"]);
    }

    #[tokio::test]
    async fn test_counts_lines() {
        let mut lines = stream_of(&[b"a\nb\n"], LineDivisor::Lf);
        lines.next_line().await.unwrap();
        assert_eq!(lines.lines_read, 1);
        lines.next_line().await.unwrap();
        assert!(lines.next_line().await.unwrap().is_none());
        assert_eq!(lines.lines_read, 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let mut lines = stream_of(&[b"ok\n\xff\xfe\n"], LineDivisor::Lf);
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ok"));
        let err = lines.next_line().await.unwrap_err();
        assert!(err.to_string().contains("line 2 is not valid UTF-8"), "{}", err);
    }

    #[tokio::test]
    async fn test_undecodable_line_still_counts() {
        let mut lines = stream_of(&[b"ok\n\xff\nnext\n"], LineDivisor::Lf);
        lines.next_line().await.unwrap();
        assert!(lines.next_line().await.is_err());
        assert_eq!(lines.lines_read, 2);
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("next"));
        assert_eq!(lines.lines_read, 3);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let lines = stream_of(&[], LineDivisor::Lf);
        assert!(drain(lines).await.is_empty());
    }
}
