// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable debounce timer
//!
//! [`Debounce`] is the bookkeeping half: it holds at most one pending action
//! and tags every arming with a generation, so a late wake-up from a
//! superseded arming is recognised and ignored. [`ArmedSleep`] is the
//! runtime half that actually waits on the tokio clock.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle for one arming of a [`Debounce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTicket {
    pub generation: u64,
    pub delay: Duration,
}

/// Single-slot cancel-and-reschedule timer
#[derive(Debug)]
pub struct Debounce<A> {
    generation: u64,
    pending: Option<(u64, A)>,
}

impl<A> Default for Debounce<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Debounce<A> {
    pub const fn new() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }

    /// Arm the timer, dropping whatever was pending
    pub fn schedule(&mut self, delay: Duration, action: A) -> TimerTicket {
        self.generation += 1;
        self.pending = Some((self.generation, action));
        TimerTicket {
            generation: self.generation,
            delay,
        }
    }

    /// Drop the pending action. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Claim the action for an elapsed ticket
    ///
    /// Only the most recent arming can fire, and only once.
    pub fn fire(&mut self, generation: u64) -> Option<A> {
        let live = self.pending.as_ref().map(|(live, _)| *live);
        if live == Some(generation) {
            self.pending.take().map(|(_, action)| action)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A sleeping task that runs a callback once its delay elapses
///
/// Re-arming or dropping aborts the previous sleep before it can run.
#[derive(Debug, Default)]
pub struct ArmedSleep {
    handle: Option<JoinHandle<()>>,
}

impl ArmedSleep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&mut self, delay: Duration, on_elapsed: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.disarm();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_elapsed();
        }));
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ArmedSleep {
    fn drop(&mut self) {
        self.disarm();
    }
}
