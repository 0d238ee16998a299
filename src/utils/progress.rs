/// Observer notified while an index is being built.
///
/// `report` receives one "current value" per processed unit: the number of rows indexed so far
/// when the scan has a row cap, otherwise the cumulative number of bytes scanned. It is purely
/// advisory, the engine never reads anything back from it.
///
/// Any `FnMut(u64)` closure is an observer:
///
/// ```
/// # use rowseek::utils::progress::ProgressObserver;
/// let mut seen = Vec::new();
/// let mut observer = |current: u64| seen.push(current);
/// observer.report(10);
/// observer.report(20);
/// assert_eq!(seen, vec![10, 20]);
/// ```
pub trait ProgressObserver {
    fn report(&mut self, current: u64);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u64),
{
    fn report(&mut self, current: u64) {
        self(current)
    }
}
