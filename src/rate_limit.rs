//! In-memory rate limiting for canvas API calls.
//!
//! DESIGN
//! ======
//! Sliding-window counter backed by `VecDeque<Instant>`. One limiter is
//! created per canvas client and shared by clone across concurrent calls;
//! there is no process-wide instance. Callers either check without blocking
//! (`check_and_record`) or wait for a free slot (`acquire`).
//!
//! The default of 900 calls per minute sits below the canvas API's
//! per-minute allowance so that bursts of note creation are smoothed here
//! rather than rejected remotely.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ErrorCode;

pub const DEFAULT_CALL_LIMIT: usize = 900;
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Extra wait past the oldest call's expiry so the slot is free on wake.
const WAKE_SLACK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub limit: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { limit: DEFAULT_CALL_LIMIT, window: Duration::from_secs(DEFAULT_WINDOW_SECS) }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("canvas rate limit exceeded (max {limit} calls/{window_secs}s)")]
    Exceeded { limit: usize, window_secs: u64, retry_after: Duration },
}

impl ErrorCode for RateLimitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Exceeded { .. } => "E_RATE_LIMITED",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Debug, Clone)]
pub struct RateLimiter {
    calls: Arc<Mutex<VecDeque<Instant>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// A zero limit is treated as one call per window.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        let config = RateLimitConfig { limit: config.limit.max(1), ..config };
        Self { calls: Arc::new(Mutex::new(VecDeque::new())), config }
    }

    #[must_use]
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Check the window and record the call if there is room.
    pub fn check_and_record(&self) -> Result<(), RateLimitError> {
        self.check_and_record_at(Instant::now())
    }

    /// Internal: check + record with explicit timestamp (for testing).
    fn check_and_record_at(&self, now: Instant) -> Result<(), RateLimitError> {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let cfg = self.config;

        prune_window(&mut calls, now, cfg.window);
        if calls.len() >= cfg.limit {
            let retry_after = calls
                .front()
                .map_or(cfg.window, |&oldest| cfg.window.saturating_sub(now.duration_since(oldest)));
            return Err(RateLimitError::Exceeded {
                limit: cfg.limit,
                window_secs: cfg.window.as_secs(),
                retry_after,
            });
        }

        calls.push_back(now);
        Ok(())
    }

    /// Wait until a call slot is free, then record the call.
    pub async fn acquire(&self) {
        loop {
            match self.check_and_record() {
                Ok(()) => return,
                Err(RateLimitError::Exceeded { retry_after, .. }) => {
                    debug!(wait_secs = retry_after.as_secs_f64(), "canvas rate limit reached; waiting");
                    tokio::time::sleep(retry_after + WAKE_SLACK).await;
                }
            }
        }
    }

    /// Calls currently counted against the window.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded_at(Instant::now())
    }

    fn recorded_at(&self, now: Instant) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        prune_window(&mut calls, now, self.config.window);
        calls.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
