//! Typed command handlers. The CLI layer parses and validates the raw
//! input; these functions carry out the operations against disk images
//! and the in-memory context.

mod disk_cmds;
mod file_cmds;
mod user_cmds;

pub use disk_cmds::{create_disk, create_partition, format, mount, remove_disk};
pub use file_cmds::{make_directory, make_file};
pub use user_cmds::{
    change_group, login, logout, make_group, make_user, remove_group, remove_user,
};

use std::fs::File;

use crate::codec::DiskRecord;
use crate::disk::{image, Mbr, PartitionEntry};
use crate::error::Result;
use crate::fs::Superblock;
use crate::session::Context;

/// Open the disk holding the mounted partition `mount_id` and locate its
/// partition entry.
pub(crate) fn mounted_partition(ctx: &Context, mount_id: &str) -> Result<(File, PartitionEntry)> {
    let mounted = ctx.mounts.get(mount_id)?;
    let mut file = image::open_disk(&mounted.path)?;
    let mbr = Mbr::decode(&mut file, 0)?;
    let slot = mbr.find_by_id(mount_id)?;
    Ok((file, mbr.partitions[slot]))
}

/// Like [mounted_partition], also decoding the partition's superblock.
pub(crate) fn mounted_filesystem(
    ctx: &Context,
    mount_id: &str,
) -> Result<(File, PartitionEntry, Superblock)> {
    let (mut file, part) = mounted_partition(ctx, mount_id)?;
    let sb = Superblock::decode(&mut file, part.start as u64)?;
    if !sb.is_formatted() {
        return Err(crate::error::FsError::Parameter(format!(
            "partition {mount_id} is not formatted"
        )));
    }
    Ok((file, part, sb))
}
