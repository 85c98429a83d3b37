// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff for collaborator failures.

use std::time::Duration;

/// Bounded exponential backoff: `base_delay` doubling per consecutive
/// failure, capped at `max_delay`, giving up after `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    ed_core::setters! {
        set {
            max_attempts: u32,
            base_delay: Duration,
            max_delay: Duration,
        }
    }

    /// Delay after the `attempt`-th consecutive failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff { policy: *self, attempts: 0 }
    }
}

/// Consecutive-failure counter for one retry loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempts: u32,
}

impl Backoff {
    /// Record a failure. Returns the delay before the next attempt, or `None`
    /// once the attempt ceiling is reached.
    pub fn fail(&mut self) -> Option<Duration> {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        Some(self.policy.delay_for(self.attempts))
    }

    /// A success clears the failure count.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
