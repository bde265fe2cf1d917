//! Disk-level commands: image lifecycle, partitioning, mounting and
//! formatting.

use std::path::Path;

use crate::codec::{fixed_name, DiskRecord};
use crate::disk::{ebr, image, Ebr, Fit, Mbr, MountedPartition, PartitionKind};
use crate::error::{FsError, Result};
use crate::fs::{self, Superblock};
use crate::session::Context;
use crate::utils::units::{self, SizeUnit};

/// Create a zero-filled disk image with a fresh partition table.
pub fn create_disk(path: &Path, size: i64, unit: SizeUnit, fit: Fit) -> Result<()> {
    log::info!("create_disk {} size={size} {unit:?}", path.display());
    let bytes = units::to_bytes(size, unit)?;
    image::create_disk(path, bytes, fit)
}

/// Delete a disk image.
pub fn remove_disk(path: &Path) -> Result<()> {
    log::info!("remove_disk {}", path.display());
    image::remove_disk(path)
}

/// Create a primary, extended or logical partition on an existing disk.
pub fn create_partition(
    path: &Path,
    size: i64,
    unit: SizeUnit,
    fit: Fit,
    kind: PartitionKind,
    name: &str,
) -> Result<()> {
    log::info!(
        "create_partition {} {kind:?} {name:?} size={size} {unit:?}",
        path.display()
    );
    let bytes = units::to_bytes(size, unit)?;
    let mut file = image::open_disk(path)?;
    let mut mbr = Mbr::decode(&mut file, 0)?;
    match kind {
        PartitionKind::Logical => {
            let extended = *mbr.extended().ok_or_else(|| {
                FsError::Parameter(format!(
                    "disk {} has no extended partition",
                    path.display()
                ))
            })?;
            ebr::create_logical(&mut file, &extended, fit, bytes, name)
        }
        PartitionKind::Primary | PartitionKind::Extended => {
            let slot = mbr.add_partition(kind, fit, bytes, name)?;
            if kind == PartitionKind::Extended {
                let start = mbr.partitions[slot].start;
                Ebr::sentinel(start, fit).encode(&mut file, start as u64)?;
            }
            mbr.encode(&mut file, 0)?;
            log::info!("created {kind:?} partition {name:?} in slot {slot}");
            Ok(())
        }
    }
}

/// Mount the primary partition named `name` and return its mount id.
pub fn mount(ctx: &mut Context, path: &Path, name: &str) -> Result<String> {
    let mut file = image::open_disk(path)?;
    let mut mbr = Mbr::decode(&mut file, 0)?;
    let slot = mbr.find_by_name(name)?;
    if mbr.partitions[slot].kind != b'P' {
        return Err(FsError::Parameter(format!(
            "partition {name:?} is not primary and cannot be mounted"
        )));
    }
    let id = ctx.mounts.make_id(path, slot);
    if ctx.mounts.contains(&id) {
        return Err(FsError::AlreadyExists(format!(
            "partition {name:?} is already mounted as {id}"
        )));
    }
    let entry = &mut mbr.partitions[slot];
    entry.status = 1;
    entry.correlative = slot as i32 + 1;
    entry.mount_id = fixed_name(&id)?;
    let part_name = entry.name_str();
    mbr.encode(&mut file, 0)?;
    ctx.mounts.register(MountedPartition {
        id: id.clone(),
        path: path.to_path_buf(),
        name: part_name,
    })?;
    log::info!("mounted {name:?} from {} as {id}", path.display());
    Ok(id)
}

/// Format the mounted partition `mount_id`, wiping any previous content.
pub fn format(ctx: &Context, mount_id: &str) -> Result<Superblock> {
    log::info!("format {mount_id}");
    let (mut file, part) = super::mounted_partition(ctx, mount_id)?;
    fs::format::format(&mut file, part.start, part.size)
}
