/*!
 * Retry policy and per-chunk retry state machine.
 *
 * The machine starts in `Pending`, moves through `Waiting`/`Retrying` while
 * transient failures are absorbed, and ends in exactly one of `Succeeded`,
 * `FailedFatal` or `FailedExhausted`. It never sleeps itself; the caller acts
 * on the returned `RetryDecision`.
 */

use std::time::Duration;

use crate::app_config::TranslationCommonConfig;
use crate::errors::ProviderError;

/// Attempt budget and exponential backoff shape
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per chunk, including the first one
    pub max_attempts: u32,
    /// Length of one backoff unit
    pub unit: Duration,
    /// Upper bound for a single wait, in units
    pub cap_units: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            unit: Duration::from_secs(1),
            cap_units: 20,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, unit: Duration, cap_units: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
            cap_units,
        }
    }

    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self::new(
            common.max_attempts,
            Duration::from_millis(common.backoff_unit_ms),
            common.backoff_cap_units,
        )
    }

    /// Wait after the failure of `attempt` (0-based): `min(2^attempt, cap)` units
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let units = 2u64
            .checked_pow(attempt)
            .unwrap_or(u64::MAX)
            .min(self.cap_units);
        self.unit.saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
    }
}

/// States of one chunk's retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// First attempt not resolved yet
    Pending,
    /// Backing off before the next attempt
    Waiting(Duration),
    /// A retry attempt is due or in flight
    Retrying,
    Succeeded,
    FailedFatal,
    FailedExhausted,
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedFatal | Self::FailedExhausted)
    }
}

/// What the caller should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given duration, then call `resume` and try again
    Wait(Duration),
    /// Non-transient failure, stop now
    Fatal,
    /// Transient failure but no attempts left
    Exhausted,
}

/// Bounded retry loop for one chunk
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
    attempts: u32,
    waits: Vec<Duration>,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Pending,
            attempts: 0,
            waits: Vec::new(),
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Backoff waits decided so far, in order
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// Count an attempt about to be made; returns its 0-based number
    pub fn begin_attempt(&mut self) -> u32 {
        debug_assert!(matches!(self.state, RetryState::Pending | RetryState::Retrying));
        let attempt = self.attempts;
        self.attempts += 1;
        attempt
    }

    pub fn record_success(&mut self) {
        self.state = RetryState::Succeeded;
    }

    /// Classify a failed attempt and move to the next state
    pub fn record_failure(&mut self, error: &ProviderError) -> RetryDecision {
        if !error.is_transient() {
            self.state = RetryState::FailedFatal;
            return RetryDecision::Fatal;
        }

        if self.attempts >= self.policy.max_attempts {
            self.state = RetryState::FailedExhausted;
            return RetryDecision::Exhausted;
        }

        let wait = self.policy.backoff_for(self.attempts.saturating_sub(1));
        self.waits.push(wait);
        self.state = RetryState::Waiting(wait);
        RetryDecision::Wait(wait)
    }

    /// Leave `Waiting` once the backoff has elapsed
    pub fn resume(&mut self) {
        if let RetryState::Waiting(_) = self.state {
            self.state = RetryState::Retrying;
        }
    }
}
