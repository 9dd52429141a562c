//! Shared value types: ingestion timestamps and the clock that issues them.
//!
//! Event timestamps are assigned at ingestion time, never read from the
//! payload. They are whole Unix seconds (UTC) so that windowed queries compare
//! plain integers.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC instant with whole-second precision, stored as Unix seconds.
///
/// Serialises as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Returns the current UTC time, truncated to the second.
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Creates a [`Timestamp`] from Unix seconds.
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`], dropping sub-second precision.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    /// Returns the Unix seconds value.
    pub fn as_unix_seconds(self) -> i64 {
        self.0
    }

    /// Returns the instant as a [`DateTime<Utc>`], or `None` if it is outside
    /// chrono's representable range.
    pub fn as_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    /// Returns the instant `window` before this one, saturating at the
    /// smallest representable value.
    pub fn saturating_sub(self, window: Duration) -> Self {
        let secs = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(secs))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "@{}", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Source of ingestion timestamps.
///
/// Injected into the orchestrator so tests can pin "now".
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock source that never goes backwards within one process.
///
/// If the system clock steps back (NTP adjustment), the last issued value is
/// repeated until wall time catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_issued: AtomicI64,
}

impl SystemClock {
    /// Creates a clock that has not issued any timestamp yet.
    pub fn new() -> Self {
        Self {
            last_issued: AtomicI64::new(i64::MIN),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Utc::now().timestamp();
        let previous = self.last_issued.fetch_max(wall, Ordering::SeqCst);
        Timestamp(previous.max(wall))
    }
}

/// Manually driven clock for tests and replay tooling.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start.as_unix_seconds()),
        }
    }

    /// Moves the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        self.now.store(instant.as_unix_seconds(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let secs = i64::try_from(by.as_secs()).unwrap_or(i64::MAX);
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_serialises_as_integer() {
        let ts = Timestamp::from_unix_seconds(1_700_000_000);
        assert_eq!(serde_json::to_value(ts).unwrap(), serde_json::json!(1_700_000_000));
        assert_eq!(ts.to_string(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn saturating_sub_subtracts_whole_seconds() {
        let ts = Timestamp::from_unix_seconds(100);
        assert_eq!(ts.saturating_sub(Duration::from_millis(15_900)).as_unix_seconds(), 85);
        assert_eq!(
            Timestamp::from_unix_seconds(i64::MIN + 1)
                .saturating_sub(Duration::from_secs(10))
                .as_unix_seconds(),
            i64::MIN
        );
    }

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock::new();
        let mut previous = clock.now();
        for _ in 0..1_000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn system_clock_holds_last_issued_value_when_wall_time_is_behind() {
        let clock = SystemClock::new();
        let future = Utc::now().timestamp() + 3_600;
        clock.last_issued.store(future, Ordering::SeqCst);
        assert_eq!(clock.now().as_unix_seconds(), future);
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(Timestamp::from_unix_seconds(1_000));
        assert_eq!(clock.now().as_unix_seconds(), 1_000);
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now().as_unix_seconds(), 1_005);
        clock.set(Timestamp::from_unix_seconds(10));
        assert_eq!(clock.now().as_unix_seconds(), 10);
    }
}
