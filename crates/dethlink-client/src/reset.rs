//! Single-shot reset timer
//!
//! Contact channels that auto-reset (motion style triggers) need a
//! delayed action that can be cancelled when a newer update supersedes
//! it. The action runs once after the delay; schedule it with a closure
//! that reads live state at fire time rather than state captured when it
//! was armed.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

/// Cancellable single-shot delayed action
#[derive(Default)]
pub struct ResetTimer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ResetTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer. A previously armed action is cancelled first.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut handle = self.handle.lock();
        if let Some(previous) = handle.take() {
            previous.abort();
        }
        trace!("reset timer armed for {:?}", delay);
        *handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Cancel the armed action, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = ResetTimer::new();
        let fired_clone = fired.clone();
        timer.schedule(Duration::from_millis(20), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = ResetTimer::new();
        let fired_clone = fired.clone();
        timer.schedule(Duration::from_millis(30), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reschedule_replaces_pending_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = ResetTimer::new();
        for _ in 0..3 {
            let fired_clone = fired.clone();
            timer.schedule(Duration::from_millis(30), move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
