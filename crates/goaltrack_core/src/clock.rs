//! Time source abstraction.
//!
//! Services never read the system clock directly; they receive a [`Clock`]
//! so tests can pin "now" and move it between calls.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current instant as Unix epoch milliseconds.
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock used in production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug, Default)]
pub struct FixedClock {
    epoch_ms: AtomicI64,
}

impl FixedClock {
    pub fn at_ms(epoch_ms: i64) -> Self {
        Self {
            epoch_ms: AtomicI64::new(epoch_ms),
        }
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::at_ms(instant.timestamp_millis())
    }

    pub fn set_ms(&self, epoch_ms: i64) {
        self.epoch_ms.store(epoch_ms, Ordering::SeqCst);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.set_ms(instant.timestamp_millis());
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.epoch_ms.fetch_add(minutes * 60_000, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let epoch_ms = self.epoch_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(epoch_ms)
            .single()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let clock = FixedClock::at_ms(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance_minutes(2);
        assert_eq!(clock.now_ms(), 121_000);
        clock.set_ms(5);
        assert_eq!((&clock).now_ms(), 5);
    }
}
