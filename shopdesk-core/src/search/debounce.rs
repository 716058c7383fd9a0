//! Keystroke debouncing
//!
//! Rapid query edits collapse into one search: each submission arms a
//! timer and cancels the previous one, so only the latest query runs
//! once input settles. Selecting a result flushes the pending query
//! immediately instead of waiting out the timer.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default settle window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Coalesces rapid submissions into a single delayed action
pub struct SearchDebouncer {
    delay: Duration,
    action: Arc<dyn Fn(String) + Send + Sync>,
    latest: Arc<Mutex<Option<String>>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration, action: impl Fn(String) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            action: Arc::new(action),
            latest: Arc::new(Mutex::new(None)),
            pending: Mutex::new(None),
        }
    }

    /// Queue a query; any previously queued one is discarded
    pub fn submit(&self, query: impl Into<String>) {
        *self.latest.lock() = Some(query.into());

        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let delay = self.delay;
        let action = self.action.clone();
        let latest = self.latest.clone();
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(query) = latest.lock().take() {
                action(query);
            }
        }));
    }

    /// Run the queued query now, skipping the remaining delay
    pub fn flush(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
        if let Some(query) = self.latest.lock().take() {
            (self.action)(query);
        }
    }

    /// Drop the queued query without running it
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
        self.latest.lock().take();
    }
}

impl std::fmt::Debug for SearchDebouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchDebouncer").field("delay", &self.delay).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<AtomicUsize>) {
        (Arc::new(Mutex::new(Vec::new())), Arc::new(AtomicUsize::new(0)))
    }

    #[tokio::test]
    async fn test_rapid_submissions_run_once_with_latest() {
        let (seen, count) = recorder();
        let (seen2, count2) = (seen.clone(), count.clone());
        let debouncer = SearchDebouncer::new(Duration::from_millis(30), move |q| {
            seen2.lock().push(q);
            count2.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.submit("c");
        debouncer.submit("co");
        debouncer.submit("copper");
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().as_slice(), ["copper"]);
    }

    #[tokio::test]
    async fn test_flush_runs_immediately() {
        let (seen, count) = recorder();
        let (seen2, count2) = (seen.clone(), count.clone());
        let debouncer = SearchDebouncer::new(Duration::from_secs(60), move |q| {
            seen2.lock().push(q);
            count2.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.submit("copper wire");
        debouncer.flush();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().as_slice(), ["copper wire"]);

        // Nothing left queued; a second flush is a no-op
        debouncer.flush();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_query() {
        let (_, count) = recorder();
        let count2 = count.clone();
        let debouncer = SearchDebouncer::new(Duration::from_millis(20), move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.submit("copper");
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
