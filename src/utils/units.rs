//! Size units accepted by the disk and partition commands.

use byte_unit::Byte;

use crate::error::{FsError, Result};

/// Unit of a user-supplied size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    /// Kibibytes (1024 bytes).
    Kilo,
    /// Mebibytes (1024 * 1024 bytes).
    Mega,
}

impl SizeUnit {
    /// Parse the single-letter unit form used by the command layer.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "K" => Ok(SizeUnit::Kilo),
            "M" => Ok(SizeUnit::Mega),
            other => Err(FsError::Parameter(format!("unit must be K or M, got {other:?}"))),
        }
    }
}

/// Convert a size in the given unit to bytes. Rejects zero and negative
/// sizes.
pub fn to_bytes(size: i64, unit: SizeUnit) -> Result<i64> {
    if size <= 0 {
        return Err(FsError::Parameter(format!(
            "size must be a positive integer, got {size}"
        )));
    }
    match unit {
        SizeUnit::Kilo => Ok(size * 1024),
        SizeUnit::Mega => Ok(size * 1024 * 1024),
    }
}

/// Human-readable form of a byte count, for error and log messages.
pub fn display_bytes(bytes: i64) -> String {
    Byte::from_bytes(bytes.max(0) as u128)
        .get_appropriate_unit(true)
        .to_string()
}
