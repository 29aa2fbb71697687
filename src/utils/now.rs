use chrono::Utc;

/// Returns the current timestamp in microseconds since the UNIX epoch.
///
/// Clocks set before 1970 read as `0`.
pub fn now() -> u64 {
    Utc::now().timestamp_micros().max(0) as u64
}
