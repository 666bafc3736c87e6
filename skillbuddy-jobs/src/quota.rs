//! Rolling-window admission control for provider calls.
//!
//! The provider plan allows a fixed number of searches per period. The
//! tracker counts calls inside a rolling window and refuses new calls once
//! the hard limit is reached. Rollover is lazy: every call compares the
//! elapsed time against the window length, no background timer runs.
//!
//! # State Machine
//!
//! ```text
//!             try_consume (count < limit)
//!           ┌──────────────┐
//!           ▼              │
//! ┌──────────────────┐     │     count == limit    ┌───────────┐
//! │ Open (count < N) ├─────┴──────────────────────►│ Exhausted │
//! └────────▲─────────┘                             └─────┬─────┘
//!          │          elapsed > window: count = 0        │
//!          └─────────────────────────────────────────────┘
//! ```

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Window state guarded by the tracker's lock.
#[derive(Debug, Clone, Copy)]
struct QuotaWindow {
    started_at: Instant,
    count: u32,
}

/// Point-in-time view of the quota, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    /// Calls consumed in the active window.
    pub used: u32,
    /// Hard limit per window.
    pub limit: u32,
    /// Time until the active window rolls over.
    pub resets_in: Duration,
}

impl QuotaSnapshot {
    /// Calls still available in the active window.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// Thread-safe rolling quota counter.
///
/// Share it behind an `Arc`; every operation takes the internal lock for
/// the window read-modify-write only.
#[derive(Debug)]
pub struct QuotaTracker {
    limit: u32,
    window: Duration,
    state: Mutex<QuotaWindow>,
}

impl QuotaTracker {
    /// Create a tracker allowing `limit` calls per `window`. The first window
    /// starts now.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(QuotaWindow {
                started_at: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Reserve one call in the active window.
    ///
    /// Returns `true` and increments the count if capacity remains,
    /// otherwise returns `false` and leaves the state untouched (apart from
    /// a due rollover).
    pub fn try_consume(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.roll_if_elapsed(&mut state);

        if state.count < self.limit {
            state.count += 1;
            tracing::debug!(used = state.count, limit = self.limit, "quota unit consumed");
            true
        } else {
            tracing::debug!(limit = self.limit, "quota exhausted for current window");
            false
        }
    }

    /// Calls left in the active window.
    ///
    /// Advisory only: callers must still use [`try_consume`](Self::try_consume)
    /// to reserve a call.
    pub fn remaining(&self) -> u32 {
        self.snapshot().remaining()
    }

    /// Current usage, limit and time to reset.
    pub fn snapshot(&self) -> QuotaSnapshot {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.started_at);
        if elapsed > self.window {
            // An elapsed window reads as fresh without mutating state.
            return QuotaSnapshot {
                used: 0,
                limit: self.limit,
                resets_in: self.window,
            };
        }
        QuotaSnapshot {
            used: state.count,
            limit: self.limit,
            resets_in: self.window - elapsed,
        }
    }

    /// Hard limit per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn roll_if_elapsed(&self, state: &mut QuotaWindow) {
        let now = Instant::now();
        if now.saturating_duration_since(state.started_at) > self.window {
            tracing::debug!(previous_count = state.count, "quota window rolled over");
            state.started_at = now;
            state.count = 0;
        }
    }
}
