//! Master boot record: the 4-slot partition table at offset 0 of every
//! disk image.

use serde::{Deserialize, Serialize};

use crate::codec::{fixed_name, name_str, DiskRecord};
use crate::error::{FsError, Result};
use crate::utils::{time_util, units};

/// Number of primary/extended slots in the table.
pub const PARTITION_SLOTS: usize = 4;

/// Placement fit recorded in partition entries. The fit is recorded only:
/// slot allocation is append-only and never runs a best/worst-fit hole
/// search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Best,
    First,
    Worst,
}

impl Fit {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B" | "BF" => Ok(Fit::Best),
            "F" | "FF" => Ok(Fit::First),
            "W" | "WF" => Ok(Fit::Worst),
            other => Err(FsError::Parameter(format!(
                "fit must be BF, FF or WF, got {other:?}"
            ))),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Fit::Best => b'B',
            Fit::First => b'F',
            Fit::Worst => b'W',
        }
    }
}

/// Kind of partition a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    Primary,
    Extended,
    Logical,
}

impl PartitionKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P" => Ok(PartitionKind::Primary),
            "E" => Ok(PartitionKind::Extended),
            "L" => Ok(PartitionKind::Logical),
            other => Err(FsError::Parameter(format!(
                "partition type must be P, E or L, got {other:?}"
            ))),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            PartitionKind::Primary => b'P',
            PartitionKind::Extended => b'E',
            PartitionKind::Logical => b'L',
        }
    }
}

/// One slot of the partition table. `start == -1` marks the slot unused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionEntry {
    /// 1 while the partition is mounted.
    pub status: u8,
    /// `b'P'` or `b'E'`.
    pub kind: u8,
    pub fit: u8,
    pub start: i64,
    pub size: i64,
    pub name: [u8; 16],
    /// Slot number assigned at mount time, -1 before the first mount.
    pub correlative: i32,
    /// Mount id assigned at mount time, NULs before the first mount.
    pub mount_id: [u8; 4],
}

impl DiskRecord for PartitionEntry {
    const WIDTH: usize = 43;
}

impl PartitionEntry {
    pub fn empty() -> Self {
        PartitionEntry {
            status: 0,
            kind: 0,
            fit: 0,
            start: -1,
            size: -1,
            name: [0; 16],
            correlative: -1,
            mount_id: [0; 4],
        }
    }

    pub fn is_used(&self) -> bool {
        self.start != -1
    }

    pub fn is_mounted(&self) -> bool {
        self.status == 1
    }

    pub fn name_str(&self) -> String {
        name_str(&self.name)
    }

    pub fn id_str(&self) -> String {
        name_str(&self.mount_id)
    }
}

/// The record at offset 0 of a disk image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mbr {
    pub total_size: i64,
    pub creation_time: i64,
    pub disk_signature: u32,
    pub default_fit: u8,
    pub partitions: [PartitionEntry; PARTITION_SLOTS],
}

impl DiskRecord for Mbr {
    const WIDTH: usize = 193;
}

impl Mbr {
    pub fn new(total_size: i64, fit: Fit) -> Self {
        Mbr {
            total_size,
            creation_time: time_util::now(),
            disk_signature: time_util::now_nanos(),
            default_fit: fit.as_byte(),
            partitions: [PartitionEntry::empty(); PARTITION_SLOTS],
        }
    }

    /// First unused slot and the byte offset where its partition would
    /// start. Occupied slots are packed, so the offset is the MBR width
    /// plus the sizes of the occupied slots before it.
    pub fn first_free_slot(&self) -> Result<(usize, i64)> {
        let mut start = Self::WIDTH as i64;
        for (slot, entry) in self.partitions.iter().enumerate() {
            if entry.is_used() {
                start += entry.size;
            } else {
                return Ok((slot, start));
            }
        }
        Err(FsError::NoSpace(
            "all 4 partition slots are occupied".into(),
        ))
    }

    /// Slot index of the partition named `name` (case-insensitive,
    /// trimmed).
    pub fn find_by_name(&self, name: &str) -> Result<usize> {
        let want = name.trim().to_ascii_lowercase();
        self.partitions
            .iter()
            .position(|p| p.is_used() && p.name_str().to_ascii_lowercase() == want)
            .ok_or_else(|| FsError::NotFound(format!("partition {name:?}")))
    }

    /// Slot index of the partition carrying mount id `id`.
    pub fn find_by_id(&self, id: &str) -> Result<usize> {
        let want = id.trim().to_ascii_lowercase();
        self.partitions
            .iter()
            .position(|p| p.is_used() && p.id_str().to_ascii_lowercase() == want)
            .ok_or_else(|| FsError::NotFound(format!("mounted partition {id:?}")))
    }

    pub fn extended(&self) -> Option<&PartitionEntry> {
        self.partitions
            .iter()
            .find(|p| p.is_used() && p.kind == b'E')
    }

    pub fn has_extended(&self) -> bool {
        self.extended().is_some()
    }

    /// Bytes not yet claimed by any slot. Fails when the table is full by
    /// size.
    pub fn available_space(&self) -> Result<i64> {
        let used: i64 = self
            .partitions
            .iter()
            .filter(|p| p.is_used())
            .map(|p| p.size)
            .sum();
        let free = self.total_size - Self::WIDTH as i64 - used;
        if free <= 0 {
            return Err(FsError::NoSpace(format!(
                "disk of {} has no unclaimed space left",
                units::display_bytes(self.total_size)
            )));
        }
        Ok(free)
    }

    /// Fill the first free slot with a new primary or extended partition
    /// and return the slot index. The caller persists the updated record;
    /// for an extended partition it also writes the sentinel EBR at the
    /// partition start.
    pub fn add_partition(
        &mut self,
        kind: PartitionKind,
        fit: Fit,
        size: i64,
        name: &str,
    ) -> Result<usize> {
        if size <= 0 {
            return Err(FsError::Parameter(format!(
                "partition size must be positive, got {size}"
            )));
        }
        if kind == PartitionKind::Logical {
            return Err(FsError::Parameter(
                "logical partitions live in the EBR chain, not the MBR".into(),
            ));
        }
        if self.find_by_name(name).is_ok() {
            return Err(FsError::AlreadyExists(format!("partition {name:?}")));
        }
        if kind == PartitionKind::Extended && self.has_extended() {
            return Err(FsError::AlreadyExists(
                "this disk already has an extended partition".into(),
            ));
        }
        let free = self.available_space()?;
        if size > free {
            return Err(FsError::NoSpace(format!(
                "requested {} but only {} remain",
                units::display_bytes(size),
                units::display_bytes(free)
            )));
        }
        let (slot, start) = self.first_free_slot()?;
        self.partitions[slot] = PartitionEntry {
            status: 0,
            kind: kind.as_byte(),
            fit: fit.as_byte(),
            start,
            size,
            name: fixed_name(name)?,
            correlative: -1,
            mount_id: [0; 4],
        };
        Ok(slot)
    }
}
