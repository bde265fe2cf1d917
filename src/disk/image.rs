//! Disk image lifecycle: creation, removal and per-command opening.

use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::Path;

use crate::codec::DiskRecord;
use crate::disk::mbr::{Fit, Mbr};
use crate::error::{FsError, Result};
use crate::utils::units;

const ZERO_CHUNK: usize = 1024 * 1024;

/// Create a zero-filled image of exactly `size_bytes` bytes and stamp a
/// fresh MBR at offset 0. Missing parent directories are created.
pub fn create_disk(path: &Path, size_bytes: i64, fit: Fit) -> Result<()> {
    if size_bytes <= Mbr::WIDTH as i64 {
        return Err(FsError::Parameter(format!(
            "disk of {} cannot hold a partition table",
            units::display_bytes(size_bytes)
        )));
    }
    if path.exists() {
        return Err(FsError::AlreadyExists(format!(
            "disk image {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)?;
    let zeros = vec![0u8; ZERO_CHUNK];
    let mut remaining = size_bytes as usize;
    while remaining > 0 {
        let chunk = remaining.min(ZERO_CHUNK);
        file.write_all(&zeros[..chunk])?;
        remaining -= chunk;
    }
    Mbr::new(size_bytes, fit).encode(&mut file, 0)?;
    log::info!(
        "created disk image {} ({})",
        path.display(),
        units::display_bytes(size_bytes)
    );
    Ok(())
}

/// Delete a disk image from the host filesystem.
pub fn remove_disk(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(FsError::NotFound(format!("disk image {}", path.display())));
    }
    fs::remove_file(path)?;
    log::info!("removed disk image {}", path.display());
    Ok(())
}

/// Open an existing image for one command's read/write sequence. The
/// handle drops at the end of the command.
pub fn open_disk(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FsError::NotFound(format!("disk image {}", path.display()))
            } else {
                FsError::Io(e)
            }
        })
}
