//! Disk images, the partition table and the in-memory mount table.

pub mod ebr;
pub mod image;
pub mod mbr;
pub mod mount;

pub use ebr::Ebr;
pub use mbr::{Fit, Mbr, PartitionEntry, PartitionKind};
pub use mount::{MountTable, MountedPartition};
