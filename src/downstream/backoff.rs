//! Reconnection schedule for the downstream link

use std::time::Duration;

/// How the link retries after losing the playout service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before the first attempt
    pub initial_delay: Duration,
    /// Upper bound on any single wait
    pub max_delay: Duration,
    /// Factor applied to the wait after each failed attempt
    pub multiplier: u32,
    /// Attempts before giving up (0 = retry forever)
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            max_attempts: 0,
        }
    }
}

impl ReconnectPolicy {
    /// Give up after `max_attempts` failures
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the first and largest waits
    pub fn delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Set the growth factor
    pub fn multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Iterate over the waits before each attempt
    pub fn schedule(&self) -> Backoff {
        Backoff {
            next: self.initial_delay.min(self.max_delay),
            max: self.max_delay,
            multiplier: self.multiplier.max(1),
            remaining: (self.max_attempts > 0).then_some(self.max_attempts),
        }
    }
}

/// Exponential backoff iterator, see [`ReconnectPolicy::schedule`]
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: u32,
    remaining: Option<u32>,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if let Some(remaining) = &mut self.remaining {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let delay = self.next;
        self.next = self.next.saturating_mul(self.multiplier).min(self.max);
        Some(delay)
    }
}
