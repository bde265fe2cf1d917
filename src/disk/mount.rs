//! In-memory mount table. Lives for the process lifetime inside the
//! command context; nothing here persists across restarts.

use std::path::{Path, PathBuf};

use crate::error::{FsError, Result};

/// Prefix of every generated mount id.
pub const MOUNT_ID_PREFIX: &str = "46";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedPartition {
    pub id: String,
    pub path: PathBuf,
    pub name: String,
}

/// Table of mounted partitions. Each distinct disk path gets a letter in
/// first-seen order; letters are never reused within a run, so a mount id
/// keeps its meaning for the whole session.
#[derive(Debug, Default)]
pub struct MountTable {
    entries: Vec<MountedPartition>,
    disk_letters: Vec<PathBuf>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Letter assigned to `path`, allocating the next one on first sight.
    pub fn letter_for(&mut self, path: &Path) -> char {
        let index = match self.disk_letters.iter().position(|p| p == path) {
            Some(i) => i,
            None => {
                self.disk_letters.push(path.to_path_buf());
                self.disk_letters.len() - 1
            }
        };
        (b'A' + index as u8) as char
    }

    /// Mount id for partition slot `slot` of the disk at `path`:
    /// `<prefix><slot + 1><disk letter>`.
    pub fn make_id(&mut self, path: &Path, slot: usize) -> String {
        let letter = self.letter_for(path);
        format!("{MOUNT_ID_PREFIX}{}{letter}", slot + 1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|m| m.id == id)
    }

    pub fn register(&mut self, entry: MountedPartition) -> Result<()> {
        if self.contains(&entry.id) {
            return Err(FsError::AlreadyExists(format!(
                "partition {:?} is already mounted as {}",
                entry.name, entry.id
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&MountedPartition> {
        self.entries
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| FsError::NotFound(format!("mount id {id:?}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountedPartition> {
        self.entries.iter()
    }
}
