//! Utility functions and helpers

use std::time::Duration;

/// Number of microseconds in one second
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Check if a byte string needs to be rendered with quotes
pub fn bytes_need_repr(data: &[u8]) -> bool {
    if data.is_empty() {
        return true;
    }

    data.iter()
        .any(|&b| !b.is_ascii_graphic() || b == b'"' || b == b'\\')
}

/// Render a binary-safe byte string for logs and display
///
/// Printable ASCII passes through, everything else is escaped the way
/// `redis-cli` does it.
pub fn bytes_repr(data: &[u8]) -> String {
    if !bytes_need_repr(data) {
        return String::from_utf8_lossy(data).into_owned();
    }

    let mut result = String::with_capacity(data.len() + 2);
    result.push('"');

    for &b in data {
        match b {
            b'"' => result.push_str("\\\""),
            b'\\' => result.push_str("\\\\"),
            b'\n' => result.push_str("\\n"),
            b'\r' => result.push_str("\\r"),
            b'\t' => result.push_str("\\t"),
            b' ' => result.push(' '),
            b if b.is_ascii_graphic() => result.push(b as char),
            b => result.push_str(&format!("\\x{:02x}", b)),
        }
    }

    result.push('"');
    result
}

/// Build a duration from a `(seconds, microseconds)` pair
///
/// Microseconds above one second carry into the seconds field.
pub fn timeval_to_duration(seconds: u64, microseconds: u64) -> Duration {
    Duration::from_secs(seconds.saturating_add(microseconds / MICROS_PER_SEC))
        + Duration::from_micros(microseconds % MICROS_PER_SEC)
}

/// Split a duration into a `(seconds, microseconds)` pair
pub fn duration_to_timeval(duration: Duration) -> (u64, u64) {
    (duration.as_secs(), u64::from(duration.subsec_micros()))
}
