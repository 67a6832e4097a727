//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - The handler shared by all invocations
//! - Process configuration
//! - Invocation counters for the debug endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::handler::Handler;

/// Invocation counters
#[derive(Debug, Default)]
pub struct InvocationStats {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`InvocationStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub in_flight: u64,
}

/// One counted invocation.
///
/// Dropping the guard without [`InvocationGuard::finish`] counts as a
/// failure, which covers requests abandoned by the client mid-flight.
#[must_use]
pub struct InvocationGuard<'a> {
    stats: &'a InvocationStats,
    success: bool,
}

impl InvocationGuard<'_> {
    pub fn finish(mut self, success: bool) {
        self.success = success;
    }
}

impl Drop for InvocationGuard<'_> {
    fn drop(&mut self) {
        self.stats.record_outcome(self.success);
    }
}

impl InvocationStats {
    /// Count a started invocation; the outcome is recorded when the guard drops
    pub fn begin(&self) -> InvocationGuard<'_> {
        self.started.fetch_add(1, Ordering::Relaxed);
        InvocationGuard {
            stats: self,
            success: false,
        }
    }

    fn record_outcome(&self, success: bool) {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let started = self.started.load(Ordering::Relaxed);
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        StatsSnapshot {
            started,
            succeeded,
            failed,
            in_flight: started.saturating_sub(succeeded + failed),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub handler: Handler,
    pub stats: InvocationStats,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, handler: Handler) -> Self {
        Self {
            config,
            handler,
            stats: InvocationStats::default(),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
