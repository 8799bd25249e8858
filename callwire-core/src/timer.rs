//! One-shot gathering deadline
//!
//! A [`GatheringTimer`] fires its callback once after a fixed delay unless it
//! is cleared first. It is used to bound how long a call attempt waits for ICE
//! gathering before forcing finalization with whatever has been collected.

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Timer construction errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimerError {
    /// Delay below zero
    #[error("Timer delay must be non-negative, got {0}ms")]
    NegativeDelay(i64),
}

#[derive(Default)]
struct TimerFlags {
    active: AtomicBool,
    expired: AtomicBool,
}

/// One-shot deadline running on the tokio runtime
///
/// The timer is running as soon as it is constructed. Dropping it does not
/// cancel it; call [`GatheringTimer::clear`] for that.
pub struct GatheringTimer {
    delay: Duration,
    flags: Arc<TimerFlags>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl GatheringTimer {
    /// Start a timer that invokes `callback` after `delay_ms` milliseconds
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if `delay_ms` is negative
    pub fn start<F>(delay_ms: i64, callback: F) -> Result<Self, TimerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let millis = u64::try_from(delay_ms).map_err(|_| TimerError::NegativeDelay(delay_ms))?;
        let delay = Duration::from_millis(millis);

        let flags = Arc::new(TimerFlags::default());
        flags.active.store(true, Ordering::SeqCst);

        let task_flags = Arc::clone(&flags);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // A clear() racing with expiry wins if it flipped the flag first.
            if !task_flags.active.swap(false, Ordering::SeqCst) {
                return;
            }
            task_flags.expired.store(true, Ordering::SeqCst);

            if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                tracing::error!(delay_ms = millis, "Gathering timer callback panicked");
            }
        });

        tracing::trace!(delay_ms = millis, "Gathering timer started");

        Ok(Self {
            delay,
            flags,
            task: Mutex::new(Some(task)),
        })
    }

    /// True between construction and firing or clearing
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flags.active.load(Ordering::SeqCst)
    }

    /// True only after the timer fired on its own
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.flags.expired.load(Ordering::SeqCst)
    }

    /// Cancel a pending fire
    ///
    /// Idempotent, and a no-op once the timer has expired.
    pub fn clear(&self) {
        if self.flags.active.swap(false, Ordering::SeqCst) {
            if let Some(task) = self.task.lock().take() {
                task.abort();
            }
            tracing::trace!("Gathering timer cleared");
        }
    }
}

impl std::fmt::Debug for GatheringTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatheringTimer")
            .field("delay", &self.delay)
            .field("active", &self.is_active())
            .field("expired", &self.is_expired())
            .finish()
    }
}
