//! Count-down completion latch.
//!
//! A [`Latch`] starts with a number of pending events. Every
//! [`Latch::signal`] retires one of them and every waiter is released once
//! none are left. Release is permanent: later waits return immediately.

use std::{
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

use crate::{Operation, RelayError};

#[derive(Debug)]
pub struct Latch {
    count: Mutex<usize>,
    released: Condvar,
    #[cfg(feature = "tokio")]
    notify: tokio::sync::Notify,
}

impl Latch {
    /// Creates a latch with `count` pending events.
    ///
    /// # Panics
    ///
    /// * If `count` is 0
    #[must_use]
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "latch count must be positive");

        Self {
            count: Mutex::new(count),
            released: Condvar::new(),
            #[cfg(feature = "tokio")]
            notify: tokio::sync::Notify::new(),
        }
    }

    /// Number of events still pending.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap()
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.count() == 0
    }

    /// Retires one pending event, waking every waiter if it was the last.
    ///
    /// Returns the number of events still pending.
    ///
    /// # Errors
    ///
    /// * If the latch was already released
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn signal(&self) -> Result<usize, RelayError> {
        let mut count = self.count.lock().unwrap();

        if *count == 0 {
            log::warn!("signal: latch already released");
            return Err(RelayError::LatchOverSignaled);
        }

        *count -= 1;
        let remaining = *count;
        drop(count);

        log::debug!("signal: remaining={remaining}");

        if remaining == 0 {
            self.released.notify_all();
            #[cfg(feature = "tokio")]
            self.notify.notify_waiters();
        }

        Ok(remaining)
    }

    /// Blocks the calling thread until the latch is released.
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn wait(&self) {
        let count = self.count.lock().unwrap();
        let _count = self.released.wait_while(count, |count| *count > 0).unwrap();
    }

    /// Blocks until the latch is released or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// * If `timeout` elapsed with events still pending
    ///
    /// # Panics
    ///
    /// * If the internal mutex is poisoned
    pub fn wait_timeout(&self, timeout: Duration) -> Result<(), RelayError> {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock().unwrap();

        while *count > 0 {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                return Err(RelayError::Timeout {
                    operation: Operation::Wait,
                    after: timeout,
                });
            };
            count = self.released.wait_timeout(count, left).unwrap().0;
        }

        Ok(())
    }

    /// Waits with the optional deadline applied.
    ///
    /// # Errors
    ///
    /// * See [`Latch::wait_timeout`]
    pub fn wait_within(&self, timeout: Option<Duration>) -> Result<(), RelayError> {
        match timeout {
            Some(timeout) => self.wait_timeout(timeout),
            None => {
                self.wait();
                Ok(())
            }
        }
    }

    /// Waits for release without blocking a runtime worker.
    #[cfg(feature = "tokio")]
    pub async fn wait_async(&self) {
        loop {
            // Registered before the check so a release in between is not missed.
            let notified = self.notify.notified();
            if self.is_released() {
                return;
            }
            notified.await;
        }
    }

    /// Returns a guard that signals this latch when dropped.
    #[must_use]
    pub const fn guard(&self) -> LatchGuard<'_> {
        LatchGuard { latch: self }
    }
}

/// Signals its [`Latch`] on drop, whichever way the owning scope exits.
#[derive(Debug)]
#[must_use = "the latch is signaled as soon as the guard is dropped"]
pub struct LatchGuard<'a> {
    latch: &'a Latch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.latch.signal() {
            log::error!("Failed to signal latch on drop: {e:?}");
        }
    }
}
