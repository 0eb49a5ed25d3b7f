use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use uqbar_base::Debouncer;

type Persist = Arc<dyn Fn(String, String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Debounced nickname edits, one window per address. Only the last nickname
/// typed for an address within the window is persisted.
pub struct NicknameEditor {
    window: Duration,
    persist: Persist,
    pending: Mutex<HashMap<String, Debouncer<String>>>,
}

impl NicknameEditor {
    /// Persist edits with `persist(address, nick)` once `window` has passed
    /// without another edit of the same address.
    pub fn new<F, Fut>(window: Duration, persist: F) -> Self
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            window,
            persist: Arc::new(move |address, nick| Box::pin(persist(address, nick))),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Record an edit. Must be called from within a tokio runtime.
    pub fn edit(&self, address: &str, nick: &str) {
        let mut pending = self.pending.lock();
        pending
            .entry(address.to_owned())
            .or_insert_with(|| {
                let persist = self.persist.clone();
                let address = address.to_owned();
                Debouncer::new(self.window, move |nick: String| persist(address.clone(), nick))
            })
            .push(nick.to_owned());
    }

    /// True while an edit of `address` waits to be persisted
    pub fn is_pending(&self, address: &str) -> bool {
        self.pending
            .lock()
            .get(address)
            .is_some_and(Debouncer::is_pending)
    }
}

impl Debug for NicknameEditor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NicknameEditor")
            .field("window", &self.window)
            .field("addresses", &self.pending.lock().len())
            .finish()
    }
}
