//! Error taxonomy shared by every layer of the crate.
//!
//! Each layer returns a typed failure to the command boundary; there is no
//! local recovery or retry, and partial writes that already reached the
//! image are not rolled back.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    /// A caller-supplied parameter is invalid (bad unit, empty name, ...).
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// Underlying file I/O failed. Fatal for the current command, never
    /// retried.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes remained in the image than the record width requires.
    #[error("short read: record needs {needed} bytes at offset {offset}")]
    ShortRead { offset: u64, needed: usize },

    /// A record decoded from the image is malformed.
    #[error("decode error: {0}")]
    Decode(String),

    /// No free slot, inode, block or byte range is left for the request.
    #[error("no space left: {0}")]
    NoSpace(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// No active session, or the session user lacks the privilege.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
