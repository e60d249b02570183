//! A deterministic, manually-advanced clock for tests that need to exercise
//! elapsed-time logic (retry backoff, session TTLs) without sleeping.

use std::time::Duration;

/// A clock whose current time only moves when [`Self::advance_secs`] is
/// called, so tests stay fast and deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockClock {
    now: u64,
}

impl MockClock {
    #[must_use]
    pub fn new(start_unix_secs: u64) -> Self {
        Self { now: start_unix_secs }
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.now += secs;
    }

    /// Whether at least `duration` has passed since `since` (a unix-seconds
    /// timestamp taken from this same clock).
    #[must_use]
    pub fn has_elapsed(&self, since: u64, duration: Duration) -> bool {
        self.now.saturating_sub(since) >= duration.as_secs()
    }
}

/// Timestamp formatting helpers shared by logging and persistence code.
pub mod time_utils {
    use chrono::DateTime;

    /// Formats a unix-seconds timestamp as RFC 3339, e.g. for log lines and
    /// checkpoint `updated_at` columns.
    #[must_use]
    pub fn format_timestamp(unix_secs: i64) -> String {
        DateTime::from_timestamp(unix_secs, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_elapsed() {
        let mut clock = MockClock::new(1000);
        assert_eq!(clock.now(), 1000);
        clock.advance_secs(10);
        assert_eq!(clock.now(), 1010);
        assert!(clock.has_elapsed(1000, Duration::from_secs(10)));
        assert!(!clock.has_elapsed(1000, Duration::from_secs(11)));
    }

    #[test]
    fn format_timestamp_epoch() {
        assert!(time_utils::format_timestamp(0).contains("1970"));
    }
}
