//! Quiet-period debouncing on tokio timers

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Delivers the latest pushed value once no newer value arrives for
/// the configured delay. A push clears the previous timer.
pub struct Debouncer<T> {
    delay: Duration,
    on_settle: Callback<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, on_settle: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            on_settle: Arc::new(on_settle),
            pending: Mutex::new(None),
        }
    }

    /// Restart the quiet period with `value`. Must run inside a tokio runtime.
    pub fn push(&self, value: T) {
        let on_settle = self.on_settle.clone();
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_settle(value);
        });
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(timer) {
                previous.abort();
            }
        }
    }

    /// Drop any pending value without delivering it.
    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(timer) = pending.take() {
                timer.abort();
            }
        }
    }
}
