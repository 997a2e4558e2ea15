/// Advisory progress callback, fire-and-forget
///
/// Receives `(current, total)` after each catalog page or generation round.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, current: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, current: usize, total: usize) {
        self(current, total)
    }
}

/// Notifies the observer when one is attached
pub(crate) fn notify(observer: Option<&dyn ProgressObserver>, current: usize, total: usize) {
    if let Some(observer) = observer {
        observer.on_progress(current, total);
    }
}
