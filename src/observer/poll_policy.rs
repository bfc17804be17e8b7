//! Bounded polling with backoff for waits on UI state.
//!
//! The UI gives no change notifications, so the observer has to poll. Each
//! attempt that comes back empty sleeps for the current interval plus a random
//! jitter, then the interval grows by `backoff_factor` up to `max_interval`.
//! With `timeout: None` the wait is unbounded and liveness depends on the page.

use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use rand::Rng;

use crate::bridge_errors::{BridgeError, BridgeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: u32,
    /// Upper bound of the uniform random delay added to every sleep.
    pub jitter: Duration,
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(100),
            backoff_factor: 2,
            jitter: Duration::from_millis(5),
            timeout: None,
        }
    }
}

impl PollPolicy {
    /// No sleeping between attempts. Useful for scripted collaborators.
    pub fn immediate(timeout: Option<Duration>) -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            backoff_factor: 1,
            jitter: Duration::ZERO,
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    fn next_interval(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.backoff_factor.max(1))
            .min(self.max_interval)
    }
}

/// `poll_until_with_rng` with the thread-local RNG for jitter.
pub fn poll_until<T, F>(policy: &PollPolicy, waiting_for: &'static str, attempt: F) -> BridgeResult<T>
where
    F: FnMut() -> BridgeResult<Option<T>>,
{
    poll_until_with_rng(policy, waiting_for, &mut rand::rng(), attempt)
}

/// Run `attempt` until it yields a value, it fails, or the policy times out.
///
/// The attempt always runs at least once, even with a zero timeout.
pub fn poll_until_with_rng<T, F, R>(
    policy: &PollPolicy,
    waiting_for: &'static str,
    rng: &mut R,
    mut attempt: F,
) -> BridgeResult<T>
where
    F: FnMut() -> BridgeResult<Option<T>>,
    R: Rng,
{
    let started = Instant::now();
    let mut interval = policy.initial_interval;
    let mut attempts = 0u64;

    loop {
        attempts += 1;
        if let Some(value) = attempt()? {
            if attempts > 1 {
                debug!("{waiting_for}: satisfied after {attempts} attempts");
            }
            return Ok(value);
        }

        let elapsed = started.elapsed();
        let remaining = match policy.timeout {
            Some(timeout) if elapsed >= timeout => {
                return Err(BridgeError::Timeout { waiting_for });
            }
            Some(timeout) => Some(timeout - elapsed),
            None => None,
        };

        let jitter_ms = policy.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.random_range(0..=jitter_ms))
        };
        let mut pause = interval + jitter;
        if let Some(remaining) = remaining {
            pause = pause.min(remaining);
        }
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        interval = policy.next_interval(interval);
    }
}
