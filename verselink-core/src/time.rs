//! Time and duration conversion utilities.
//!
//! Playback positions travel through the engine as `i64` milliseconds; this
//! module provides the safe conversions in and out of that representation,
//! with explicit saturation behavior, plus display formatting.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as i64, saturating at `i64::MAX`.
    ///
    /// In practice, this is always safe because durations exceeding
    /// `i64::MAX` milliseconds would represent ~292 million years.
    fn as_millis_i64(&self) -> i64;
}

impl DurationExt for Duration {
    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Convert an engine position in milliseconds back to a [`Duration`].
///
/// Negative positions (pre-roll, or a source that reports before zero)
/// clamp to zero.
#[must_use]
pub fn millis_to_duration(millis: i64) -> Duration {
    Duration::from_millis(millis.try_into().unwrap_or(0))
}

/// Format a position for display as `m:ss`, e.g. `3:05`.
///
/// Negative positions render as `0:00` rather than propagating a sign into
/// the display.
#[must_use]
pub fn format_track_time(position_ms: i64) -> String {
    let total_secs = (position_ms / 1000).max(0);
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_i64() {
        let duration = Duration::from_millis(5000);
        assert_eq!(duration.as_millis_i64(), 5000);
    }

    #[test]
    fn test_as_millis_i64_zero() {
        let duration = Duration::ZERO;
        assert_eq!(duration.as_millis_i64(), 0);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(1234), Duration::from_millis(1234));
    }

    #[test]
    fn test_millis_to_duration_negative_clamps() {
        assert_eq!(millis_to_duration(-500), Duration::ZERO);
    }

    #[test]
    fn test_format_track_time() {
        assert_eq!(format_track_time(0), "0:00");
        assert_eq!(format_track_time(185_000), "3:05");
        assert_eq!(format_track_time(59_999), "0:59");
        assert_eq!(format_track_time(3_600_000), "60:00");
    }

    #[test]
    fn test_format_track_time_negative() {
        assert_eq!(format_track_time(-1000), "0:00");
    }
}
