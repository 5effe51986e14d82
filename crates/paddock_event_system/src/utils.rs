//! # Utility Functions

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in seconds.
///
/// A clock set before the Unix epoch yields 0.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Formats a race time given in milliseconds as `m:ss.mmm`.
pub fn format_race_time(millis: i32) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    format!(
        "{}{}:{:02}.{:03}",
        sign,
        millis / 60_000,
        (millis / 1_000) % 60,
        millis % 1_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_time_formatting() {
        assert_eq!(format_race_time(0), "0:00.000");
        assert_eq!(format_race_time(31_250), "0:31.250");
        assert_eq!(format_race_time(61_005), "1:01.005");
        assert_eq!(format_race_time(-1_500), "-0:01.500");
    }

    #[test]
    fn test_timestamp_is_after_2020() {
        assert!(current_timestamp() > 1_577_836_800);
    }
}
