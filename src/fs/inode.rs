//! Inode records.

use serde::{Deserialize, Serialize};

use crate::codec::DiskRecord;
use crate::fs::{DIRECT_POINTERS, POINTERS_PER_INODE};
use crate::utils::time_util;

pub const KIND_DIRECTORY: u8 = b'0';
pub const KIND_FILE: u8 = b'1';
pub const DEFAULT_PERM: [u8; 3] = [b'7', b'7', b'7'];

/// One inode. `pointers` holds 12 direct block indices followed by the
/// single/double/triple indirect slots; -1 marks a slot unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inode {
    pub uid: i32,
    pub gid: i32,
    pub size: i64,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
    pub pointers: [i32; POINTERS_PER_INODE],
    /// [KIND_DIRECTORY] or [KIND_FILE].
    pub kind: u8,
    pub perm: [u8; 3],
}

impl DiskRecord for Inode {
    const WIDTH: usize = 104;
}

impl Inode {
    pub fn new(kind: u8, uid: i32, gid: i32, size: i64) -> Self {
        let now = time_util::now();
        Inode {
            uid,
            gid,
            size,
            atime: now,
            ctime: now,
            mtime: now,
            pointers: [-1; POINTERS_PER_INODE],
            kind,
            perm: DEFAULT_PERM,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == KIND_DIRECTORY
    }

    pub fn is_file(&self) -> bool {
        self.kind == KIND_FILE
    }

    /// First unused direct pointer slot.
    pub fn first_free_direct(&self) -> Option<usize> {
        self.pointers[..DIRECT_POINTERS].iter().position(|&p| p == -1)
    }

    /// Every pointer is -1 or a valid block index below `block_capacity`.
    pub fn pointers_in_range(&self, block_capacity: i32) -> bool {
        self.pointers
            .iter()
            .all(|&p| p == -1 || (0..block_capacity).contains(&p))
    }

    pub fn touch_modified(&mut self) {
        let now = time_util::now();
        self.mtime = now;
        self.ctime = now;
    }
}
