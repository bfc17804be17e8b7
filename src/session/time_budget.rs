//! Per-move time allocation from the clock shown on the page.
//!
//! The budget spends a growing share of the remaining clock as the game goes
//! on: `remaining / max(min_divisor, horizon - move_number)`, capped at
//! `cap_ms` and never below 1 ms.

use chrono::Duration;

use crate::bridge_errors::{BridgeError, BridgeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudgetPolicy {
    pub cap_ms: u64,
    /// Moves the divisor counts down from.
    pub horizon: u32,
    pub min_divisor: u32,
}

impl Default for TimeBudgetPolicy {
    fn default() -> Self {
        Self {
            cap_ms: 10_000,
            horizon: 45,
            min_divisor: 20,
        }
    }
}

impl TimeBudgetPolicy {
    #[inline]
    pub fn divisor(&self, move_number: u32) -> u64 {
        u64::from(
            self.horizon
                .saturating_sub(move_number)
                .max(self.min_divisor)
                .max(1),
        )
    }

    pub fn budget_ms(&self, remaining_ms: u64, move_number: u32) -> u64 {
        (remaining_ms / self.divisor(move_number))
            .min(self.cap_ms)
            .max(1)
    }
}

/// Parse a clock reading: `m:ss`, `h:mm:ss`, optionally with tenths
/// (`0:09.4`). Negative or empty readings are rejected.
pub fn parse_clock_text(text: &str) -> BridgeResult<Duration> {
    let invalid = || BridgeError::InvalidClock(text.to_owned());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parts = trimmed.split(':').collect::<Vec<_>>();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(invalid());
    }

    let whole = |part: &str| -> BridgeResult<i64> {
        if part.is_empty() || part.len() > 6 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse::<i64>().map_err(|_| invalid())
    };

    let (seconds_part, fraction_ms) = match parts[parts.len() - 1].split_once('.') {
        Some((seconds, fraction)) => {
            if fraction.is_empty() || fraction.len() > 3 {
                return Err(invalid());
            }
            let scale = 10i64.pow(3 - fraction.len() as u32);
            (seconds, whole(fraction)? * scale)
        }
        None => (parts[parts.len() - 1], 0),
    };
    let seconds = whole(seconds_part)?;
    let minutes = whole(parts[parts.len() - 2])?;
    let hours = if parts.len() == 3 { whole(parts[0])? } else { 0 };
    if parts.len() == 3 && minutes >= 60 {
        return Err(invalid());
    }
    if seconds >= 60 {
        return Err(invalid());
    }

    Ok(Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds)
        + Duration::milliseconds(fraction_ms))
}

/// Clock text to the number of milliseconds left.
pub fn clock_text_to_ms(text: &str) -> BridgeResult<u64> {
    let remaining = parse_clock_text(text)?;
    u64::try_from(remaining.num_milliseconds()).map_err(|_| BridgeError::InvalidClock(text.to_owned()))
}
