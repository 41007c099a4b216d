//! Single-timer debounce.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

struct Pending {
    token: u64,
    handle: JoinHandle<()>,
}

/// Coalesces bursts of activity into one action fired after a quiet window.
///
/// At most one timer is pending at any time. Once a timer fires it detaches
/// itself, so arming or cancelling afterwards never aborts the action it is
/// running.
pub struct DebounceScheduler {
    window: Duration,
    pending: Arc<Mutex<Option<Pending>>>,
    next_token: AtomicU64,
}

fn lock(slot: &Mutex<Option<Pending>>) -> MutexGuard<'_, Option<Pending>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

impl DebounceScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(None)),
            next_token: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Cancels any pending timer and starts a new one that runs `action`
    /// after the window. Must be called within a tokio runtime.
    pub fn arm<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::clone(&self.pending);
        let window = self.window;

        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            {
                let mut pending = lock(&slot);
                match pending.as_ref() {
                    Some(current) if current.token == token => {
                        pending.take();
                    }
                    // Superseded.
                    _ => return,
                }
            }
            debug!("Debounce window elapsed, firing");
            action.await;
        });
        *pending = Some(Pending { token, handle });
    }

    /// Cancels the pending timer without firing it.
    pub fn cancel(&self) {
        if let Some(previous) = lock(&self.pending).take() {
            debug!("Debounce timer cancelled");
            previous.handle.abort();
        }
    }

    /// Whether a timer is waiting to fire.
    pub fn is_armed(&self) -> bool {
        lock(&self.pending).is_some()
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
