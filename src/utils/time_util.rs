//! Timestamps stored in on-disk records.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since `1970-1-1 00:00:00` ([UNIX_EPOCH]). Records store
/// timestamps as plain `i64` seconds.
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Nanosecond component of the current time. Used to derive a per-image
/// signature at creation without a RNG.
pub fn now_nanos() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0)
}
