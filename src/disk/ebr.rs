//! Extended boot records: the linked list of logical partitions inside an
//! extended partition.
//!
//! The chain starts at the extended partition's first byte with a sentinel
//! EBR of size 0. The first logical partition overwrites the sentinel in
//! place; later ones are appended after the previous partition's bytes and
//! linked through `next`.

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};

use crate::codec::{fixed_name, name_str, DiskRecord};
use crate::disk::mbr::{Fit, PartitionEntry};
use crate::error::{FsError, Result};
use crate::utils::units;

/// Header of one logical partition. `next == -1` ends the chain; `size ==
/// 0` marks the not-yet-used sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ebr {
    pub mounted: u8,
    pub fit: u8,
    pub start: i64,
    pub size: i64,
    pub next: i64,
    pub name: [u8; 16],
}

impl DiskRecord for Ebr {
    const WIDTH: usize = 42;
}

impl Ebr {
    pub fn sentinel(start: i64, fit: Fit) -> Self {
        Ebr {
            mounted: 0,
            fit: fit.as_byte(),
            start,
            size: 0,
            next: -1,
            name: [0; 16],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.size == 0
    }

    pub fn name_str(&self) -> String {
        name_str(&self.name)
    }
}

/// Walk the chain from the extended partition start; returns the tail EBR
/// and its file offset.
pub fn find_last_ebr<F>(file: &mut F, extended_start: i64) -> Result<(Ebr, u64)>
where
    F: Read + Seek,
{
    let mut offset = extended_start as u64;
    loop {
        let ebr = Ebr::decode(file, offset)?;
        if ebr.next == -1 {
            return Ok((ebr, offset));
        }
        offset = ebr.next as u64;
    }
}

/// Find the logical partition named `name` (case-insensitive, trimmed).
pub fn find_by_name<F>(file: &mut F, extended_start: i64, name: &str) -> Result<(Ebr, u64)>
where
    F: Read + Seek,
{
    let want = name.trim().to_ascii_lowercase();
    let mut offset = extended_start as u64;
    loop {
        let ebr = Ebr::decode(file, offset)?;
        if !ebr.is_sentinel() && ebr.name_str().to_ascii_lowercase() == want {
            return Ok((ebr, offset));
        }
        if ebr.next == -1 {
            return Err(FsError::NotFound(format!("logical partition {name:?}")));
        }
        offset = ebr.next as u64;
    }
}

/// Append a logical partition of `size` bytes to the chain of `extended`.
/// The size includes the EBR header at the partition start.
pub fn create_logical<F>(
    file: &mut F,
    extended: &PartitionEntry,
    fit: Fit,
    size: i64,
    name: &str,
) -> Result<()>
where
    F: Read + Write + Seek,
{
    if size <= 0 {
        return Err(FsError::Parameter(format!(
            "partition size must be positive, got {size}"
        )));
    }
    if find_by_name(file, extended.start, name).is_ok() {
        return Err(FsError::AlreadyExists(format!("logical partition {name:?}")));
    }
    let extended_end = extended.start + extended.size;
    let (tail, tail_offset) = find_last_ebr(file, extended.start)?;
    if tail.is_sentinel() {
        // First logical partition: overwrite the sentinel in place.
        if tail.start + size > extended_end {
            return Err(FsError::NoSpace(format!(
                "logical partition of {} does not fit in the extended partition",
                units::display_bytes(size)
            )));
        }
        let ebr = Ebr {
            mounted: 0,
            fit: fit.as_byte(),
            start: tail.start,
            size,
            next: -1,
            name: fixed_name(name)?,
        };
        ebr.encode(file, tail_offset)?;
    } else {
        let next_start = tail.start + tail.size;
        if next_start + size > extended_end {
            return Err(FsError::NoSpace(format!(
                "logical partition of {} does not fit after {:?}",
                units::display_bytes(size),
                tail.name_str()
            )));
        }
        let ebr = Ebr {
            mounted: 0,
            fit: fit.as_byte(),
            start: next_start,
            size,
            next: -1,
            name: fixed_name(name)?,
        };
        ebr.encode(file, next_start as u64)?;
        let mut tail = tail;
        tail.next = next_start;
        tail.encode(file, tail_offset)?;
    }
    log::info!("created logical partition {name:?} ({})", units::display_bytes(size));
    Ok(())
}
