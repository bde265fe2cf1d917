//! Virtual disks with a simplified ext2-style filesystem inside ordinary
//! host files.
//!
//! A disk image starts with an MBR holding 4 primary/extended partition
//! slots; an extended partition anchors a chain of EBRs describing logical
//! partitions. Mounted primary partitions can be formatted, which lays out
//! a superblock, packed-bit allocation bitmaps, an inode table and a block
//! table, with the root directory fixed at inode 0 and the `users.txt`
//! account registry at inode 1.
//!
//! The crate is the engine only: command parsing, report rendering and the
//! interactive loop live in external front ends, which call the typed
//! handlers in [commands] with an explicit [session::Context].

pub mod codec;
pub mod commands;
pub mod disk;
pub mod error;
pub mod fs;
pub mod session;
pub mod utils;

pub use error::{FsError, Result};
pub use session::{Context, Session};
