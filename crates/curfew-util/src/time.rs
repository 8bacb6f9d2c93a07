//! Time utilities for curfewd
//!
//! Provides the wall clock used for restricted-window decisions and the
//! hour-of-day window type itself.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `CURFEW_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for checking window behaviour in foreground mode without waiting for 21:00.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 21:30:00`)
//!
//! Example:
//! ```bash
//! CURFEW_MOCK_TIME="2025-12-25 21:30:00" curfewd --foreground
//! ```

use chrono::{DateTime, Local};
#[cfg(debug_assertions)]
use chrono::{NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "CURFEW_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, computed once at first use.
/// Mock time keeps advancing at the real rate.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // Wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, MOCK_TIME_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = MOCK_TIME_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(chrono::Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Source of wall-clock time for the guard loop
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real clock (with mock-time support in debug builds)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        now()
    }
}

/// A manually driven clock for tests and simulations
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    pub fn set(&self, at: DateTime<Local>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Half-open hour-of-day window `[start_hour, end_hour)`.
///
/// When `start_hour > end_hour` the window wraps past midnight.
/// `start_hour == end_hour` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start_hour: u8,
    end_hour: u8,
}

impl TimeWindow {
    /// Build a window, or `None` if either bound is outside `0..24`.
    pub const fn new(start_hour: u8, end_hour: u8) -> Option<Self> {
        if start_hour < 24 && end_hour < 24 {
            Some(Self {
                start_hour,
                end_hour,
            })
        } else {
            None
        }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start_hour > self.end_hour
    }

    /// Check whether the given clock hour falls within this window
    pub fn contains_hour(&self, hour: u8) -> bool {
        if hour >= 24 {
            return false;
        }

        if self.wraps_midnight() {
            // e.g. 21:00 - 11:00
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00 - {:02}:00", self.start_hour, self.end_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone, Timelike};

    #[test]
    fn test_wrapping_window_membership() {
        let window = TimeWindow::new(21, 11).unwrap();
        assert!(window.wraps_midnight());

        for hour in (21..24).chain(0..11) {
            assert!(window.contains_hour(hour), "{hour} should be in window");
        }
        for hour in 11..21 {
            assert!(!window.contains_hour(hour), "{hour} should be outside window");
        }
    }

    #[test]
    fn test_plain_window_membership() {
        let window = TimeWindow::new(14, 18).unwrap();
        assert!(!window.wraps_midnight());

        assert!(!window.contains_hour(13));
        assert!(window.contains_hour(14));
        assert!(window.contains_hour(17));
        assert!(!window.contains_hour(18));
    }

    #[test]
    fn test_empty_window() {
        let window = TimeWindow::new(9, 9).unwrap();
        assert!((0..24).all(|h| !window.contains_hour(h)));
    }

    #[test]
    fn test_out_of_range_hours() {
        assert!(TimeWindow::new(24, 3).is_none());
        assert!(TimeWindow::new(3, 24).is_none());

        let window = TimeWindow::new(21, 11).unwrap();
        assert!(!window.contains_hour(24));
        assert!(!window.contains_hour(200));
    }

    #[test]
    fn test_window_display() {
        let window = TimeWindow::new(21, 11).unwrap();
        assert_eq!(window.to_string(), "21:00 - 11:00");
    }

    #[test]
    fn test_window_serde() {
        let window = TimeWindow::new(21, 11).unwrap();
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"start_hour":21,"end_hour":11}"#);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(Local.with_ymd_and_hms(2025, 12, 25, 22, 0, 0).unwrap());
        assert_eq!(clock.now().hour(), 22);

        clock.set(Local.with_ymd_and_hms(2025, 12, 26, 12, 30, 0).unwrap());
        assert_eq!(clock.now().hour(), 12);
    }

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn test_mock_time_format() {
        assert!(NaiveDateTime::parse_from_str("2025-12-25 21:30:00", MOCK_TIME_FORMAT).is_ok());
        assert!(NaiveDateTime::parse_from_str("2025-12-25T21:30:00", MOCK_TIME_FORMAT).is_err());
        assert!(NaiveDateTime::parse_from_str("21:30:00", MOCK_TIME_FORMAT).is_err());
    }

    #[test]
    fn test_system_clock_hour_in_range() {
        assert!(SystemClock.now().hour() < 24);
    }
}
