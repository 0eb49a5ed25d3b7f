use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

type Sink<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// Delays an action until no new value has been pushed for `window`, then
/// runs it once with the last value.
///
/// Every `push` cancels the pending run and schedules a new one, so the
/// action fires at or after the last push plus `window`. Dropping the
/// debouncer cancels a pending run.
pub struct Debouncer<T> {
    window: Duration,
    sink: Sink<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer running `action` after `window` of quiet.
    pub fn new<F, Fut>(window: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            window,
            sink: Arc::new(move |value| Box::pin(action(value))),
            pending: Mutex::new(None),
        }
    }

    /// Replace the pending value and restart the window. Must be called from
    /// within a tokio runtime.
    pub fn push(&self, value: T) {
        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let sink = self.sink.clone();
        let window = self.window;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            trace!(?window, "Debounce window elapsed");
            sink(value).await;
        }));
    }

    /// True while a run is scheduled or in progress
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}

impl<T> Debug for Debouncer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
