//! The three block kinds. All of them encode to [BLOCK_SIZE] bytes, so the
//! block table is uniform and a block index addresses any kind.

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use crate::codec::{fixed_name, name_str, DiskRecord};
use crate::error::Result;
use crate::fs::{BLOCK_SIZE, POINTERS_PER_BLOCK};

/// Entries 0 and 1 of every directory block are "." and ".."; children
/// start here.
pub const CHILD_ENTRY_START: usize = 2;

/// One slot of a directory block. `inode == -1` marks the slot empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: [u8; 12],
    pub inode: i32,
}

impl DirectoryEntry {
    pub fn empty() -> Self {
        DirectoryEntry {
            name: [0; 12],
            inode: -1,
        }
    }

    pub fn new(name: &str, inode: i32) -> Result<Self> {
        Ok(DirectoryEntry {
            name: fixed_name(name)?,
            inode,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.inode == -1
    }

    pub fn name_str(&self) -> String {
        name_str(&self.name)
    }

    pub fn matches(&self, name: &str) -> bool {
        !self.is_empty() && self.name_str().eq_ignore_ascii_case(name.trim())
    }
}

/// Directory block: 4 entries, "." and ".." first, then up to two
/// children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectoryBlock {
    pub entries: [DirectoryEntry; 4],
}

impl DiskRecord for DirectoryBlock {
    const WIDTH: usize = BLOCK_SIZE;
}

impl DirectoryBlock {
    /// Fresh block for the directory at inode `own` whose parent is inode
    /// `parent`.
    pub fn new(own: i32, parent: i32) -> Self {
        let mut dot = DirectoryEntry::empty();
        dot.name[0] = b'.';
        dot.inode = own;
        let mut dotdot = DirectoryEntry::empty();
        dotdot.name[0] = b'.';
        dotdot.name[1] = b'.';
        dotdot.inode = parent;
        DirectoryBlock {
            entries: [dot, dotdot, DirectoryEntry::empty(), DirectoryEntry::empty()],
        }
    }

    /// Inode of the child named `name`, if present.
    pub fn find_child(&self, name: &str) -> Option<i32> {
        self.entries[CHILD_ENTRY_START..]
            .iter()
            .find(|e| e.matches(name))
            .map(|e| e.inode)
    }

    /// Index of the first empty child slot.
    pub fn first_empty_slot(&self) -> Option<usize> {
        self.entries[CHILD_ENTRY_START..]
            .iter()
            .position(|e| e.is_empty())
            .map(|i| i + CHILD_ENTRY_START)
    }

    pub fn parent_inode(&self) -> i32 {
        self.entries[1].inode
    }
}

/// File block: 64 raw payload bytes, zero-padded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileBlock {
    #[serde(with = "BigArray")]
    pub content: [u8; BLOCK_SIZE],
}

impl DiskRecord for FileBlock {
    const WIDTH: usize = BLOCK_SIZE;
}

impl FileBlock {
    pub fn zeroed() -> Self {
        FileBlock {
            content: [0; BLOCK_SIZE],
        }
    }

    /// Block holding `chunk` (at most [BLOCK_SIZE] bytes), zero-padded.
    pub fn from_chunk(chunk: &[u8]) -> Self {
        let mut block = Self::zeroed();
        block.content[..chunk.len()].copy_from_slice(chunk);
        block
    }

    /// Payload with trailing zero padding removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .content
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        &self.content[..end]
    }
}

/// Indirect block: 16 pointers to further blocks, -1 unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerBlock {
    pub pointers: [i32; POINTERS_PER_BLOCK],
}

impl DiskRecord for PointerBlock {
    const WIDTH: usize = BLOCK_SIZE;
}

impl PointerBlock {
    pub fn empty() -> Self {
        PointerBlock {
            pointers: [-1; POINTERS_PER_BLOCK],
        }
    }
}
