//! Cancelable one-shot deadlines for Nightfall rooms.
//!
//! A [`PhaseTimer`] holds at most one pending deadline, tagged with the key
//! of the phase it was armed for. Arming again replaces the pending
//! deadline; cancelling drops it. An expiry hands the key back so the
//! caller can check it still names the current phase before acting.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands, re-arm */ }
//!         expiry = timer.wait() => {
//!             let events = session.expire_phase(expiry.key);
//!         }
//!     }
//! }
//! ```
//!
//! With nothing armed, [`PhaseTimer::wait`] pends forever, so the branch
//! simply never fires.

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// A fired deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry<K> {
    /// The key the deadline was armed with.
    pub key: K,
    /// Which arming this was; increments on every [`PhaseTimer::arm`].
    pub generation: u64,
    /// How far past the deadline the task woke up.
    pub late_by: Duration,
}

#[derive(Debug, Clone)]
struct Pending<K> {
    key: K,
    deadline: Instant,
    generation: u64,
}

/// A single cancelable deadline.
///
/// One `PhaseTimer` per room actor. Uses Tokio's clock, so tests can drive
/// it with `tokio::time::pause()`.
#[derive(Debug)]
pub struct PhaseTimer<K> {
    pending: Option<Pending<K>>,
    generation: u64,
}

impl<K> Default for PhaseTimer<K> {
    fn default() -> Self {
        Self {
            pending: None,
            generation: 0,
        }
    }
}

impl<K: Clone + fmt::Display> PhaseTimer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a deadline `after` from now for `key`, replacing any pending
    /// one. Returns the new generation.
    pub fn arm(&mut self, key: K, after: Duration) -> u64 {
        self.generation += 1;
        if let Some(old) = self.pending.take() {
            trace!(key = %old.key, generation = old.generation, "deadline replaced");
        }
        debug!(%key, after_secs = after.as_secs_f64(), generation = self.generation, "deadline armed");
        self.pending = Some(Pending {
            key,
            deadline: Instant::now() + after,
            generation: self.generation,
        });
        self.generation
    }

    /// Drops the pending deadline, returning its key.
    ///
    /// Safe to call when nothing is armed.
    pub fn cancel(&mut self) -> Option<K> {
        let pending = self.pending.take()?;
        debug!(key = %pending.key, generation = pending.generation, "deadline cancelled");
        Some(pending.key)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Key of the pending deadline.
    pub fn key(&self) -> Option<&K> {
        self.pending.as_ref().map(|p| &p.key)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Time until the pending deadline; zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the pending deadline and disarms the timer.
    ///
    /// Pends forever when nothing is armed. Cancel-safe: dropping the
    /// future before it completes leaves the deadline armed.
    pub async fn wait(&mut self) -> Expiry<K> {
        let Some(Pending {
            key,
            deadline,
            generation,
        }) = self.pending.clone()
        else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;
        self.pending = None;

        let late_by = Instant::now().saturating_duration_since(deadline);
        if late_by > Duration::from_secs(1) {
            warn!(%key, late_ms = late_by.as_millis() as u64, "deadline fired late");
        }
        debug!(%key, generation, "deadline fired");
        Expiry {
            key,
            generation,
            late_by,
        }
    }
}
