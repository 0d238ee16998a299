use futures::Stream;
use futures::stream;
use crate::errors::Result;
use crate::reading::file_engine::FileEngine;
use crate::reading::row_record::RowRecord;

/// Sequential iteration session over a [`FileEngine`].
///
/// A session mutably borrows its engine, so only one session can exist at a time and no other
/// engine operation can run while it is alive. The read position belongs to the engine's
/// stream, not to the session: dropping a session half way and asking for a new one resumes the
/// same pass, while [`FileEngine::rewind`] starts a fresh one. The header line is never yielded.
///
/// # Examples
///
/// ```no_run
/// use rowseek::FileEngine;
///
/// #[tokio::main]
/// async fn main() -> rowseek::Result<()> {
///     let mut engine = FileEngine::new("events.csv");
///     engine.open().await?;
///
///     let mut rows = engine.iterator()?;
///     while let Some(row) = rows.next_row().await? {
///         println!("{}", row);
///     }
///
///     engine.close(Default::default())?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RowIterator<'a> {
    engine: &'a mut FileEngine,
}

impl<'a> RowIterator<'a> {
    pub(crate) fn new(engine: &'a mut FileEngine) -> Self {
        Self { engine }
    }

    /// Next data row in file order, or `None` at end of file.
    pub async fn next_row(&mut self) -> Result<Option<RowRecord>> {
        self.engine.next_sequential_row().await
    }

    /// Data rows yielded so far in the current pass, across sessions.
    pub fn rows_read(&self) -> u64 {
        self.engine.sequential_rows_yielded()
    }

    /// Adapts the session into a `Stream` of rows.
    pub fn into_stream(self) -> impl Stream<Item = Result<RowRecord>> + 'a {
        stream::try_unfold(self, |mut session| async move {
            let next = session.next_row().await;
            next.map(|row| row.map(|row| (row, session)))
        })
    }

    /// Drains the rest of the pass into a vector.
    pub async fn collect_rows(mut self) -> Result<Vec<RowRecord>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}
