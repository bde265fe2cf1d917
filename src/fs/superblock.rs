//! The superblock and the allocation paths that update it.
//!
//! Counters track usage: `inode_count`/`block_count` grow with every
//! allocation while the free counts shrink, so their sums stay at the
//! capacities fixed at format time. Allocation is scan, mark bit, update
//! counters as separate writes; a crash mid-sequence leaves bitmap and
//! superblock inconsistent and no journal repairs that.

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};

use crate::codec::DiskRecord;
use crate::error::{FsError, Result};
use crate::fs::{
    bitmap, Inode, BLOCKS_PER_INODE, BLOCK_SIZE, FS_TYPE, INODE_SIZE, MAGIC, SUPERBLOCK_SIZE,
};
use crate::utils::{time_util, units};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Superblock {
    pub fs_type: i32,
    /// Inodes in use.
    pub inode_count: i32,
    /// Blocks in use.
    pub block_count: i32,
    pub free_inode_count: i32,
    pub free_block_count: i32,
    pub mount_time: i64,
    pub unmount_time: i64,
    pub mount_count: i32,
    pub magic: u32,
    pub inode_size: i32,
    pub block_size: i32,
    /// File offset of the next inode record the scan would hand out.
    pub first_free_inode: i64,
    pub first_free_block: i64,
    pub bitmap_inode_start: i64,
    pub bitmap_block_start: i64,
    pub inode_start: i64,
    pub block_start: i64,
}

impl DiskRecord for Superblock {
    const WIDTH: usize = SUPERBLOCK_SIZE;
}

impl Superblock {
    /// Lay out a fresh filesystem over `part_size` bytes starting at
    /// `part_start`. Capacity `n` gives n inodes and 3n blocks; regions
    /// follow the superblock in order: inode bitmap, block bitmap, inode
    /// table, block table.
    pub fn new(part_start: i64, part_size: i64) -> Result<Self> {
        let n = (part_size - SUPERBLOCK_SIZE as i64)
            / (1 + INODE_SIZE as i64 + BLOCKS_PER_INODE as i64 * BLOCK_SIZE as i64);
        // root and the account file need two inodes up front
        if n < 2 {
            return Err(FsError::NoSpace(format!(
                "partition of {} is too small to format",
                units::display_bytes(part_size)
            )));
        }
        let n = n as i32;
        let bitmap_inode_start = part_start + SUPERBLOCK_SIZE as i64;
        let bitmap_block_start = bitmap_inode_start + bitmap::byte_len(n) as i64;
        let inode_start = bitmap_block_start + bitmap::byte_len(BLOCKS_PER_INODE * n) as i64;
        let block_start = inode_start + n as i64 * INODE_SIZE as i64;
        let now = time_util::now();
        Ok(Superblock {
            fs_type: FS_TYPE,
            inode_count: 0,
            block_count: 0,
            free_inode_count: n,
            free_block_count: BLOCKS_PER_INODE * n,
            mount_time: now,
            unmount_time: now,
            mount_count: 1,
            magic: MAGIC,
            inode_size: INODE_SIZE as i32,
            block_size: BLOCK_SIZE as i32,
            first_free_inode: inode_start,
            first_free_block: block_start,
            bitmap_inode_start,
            bitmap_block_start,
            inode_start,
            block_start,
        })
    }

    pub fn is_formatted(&self) -> bool {
        self.magic == MAGIC
    }

    /// Total inode capacity `n`, constant after format.
    pub fn inode_capacity(&self) -> i32 {
        self.inode_count + self.free_inode_count
    }

    pub fn block_capacity(&self) -> i32 {
        self.block_count + self.free_block_count
    }

    /// File offset of the superblock itself (the partition start).
    pub fn self_offset(&self) -> u64 {
        (self.bitmap_inode_start - SUPERBLOCK_SIZE as i64) as u64
    }

    pub fn inode_offset(&self, index: i32) -> u64 {
        (self.inode_start + index as i64 * INODE_SIZE as i64) as u64
    }

    pub fn block_offset(&self, index: i32) -> u64 {
        (self.block_start + index as i64 * BLOCK_SIZE as i64) as u64
    }

    /// Allocate the lowest free inode: scan the bitmap, mark it used and
    /// update the counters. The caller writes the inode record.
    pub fn find_next_free_inode<F>(&mut self, file: &mut F) -> Result<i32>
    where
        F: Read + Write + Seek,
    {
        let index = bitmap::find_and_mark(
            file,
            self.bitmap_inode_start as u64,
            self.inode_capacity(),
            "inode",
        )?;
        self.inode_count += 1;
        self.free_inode_count -= 1;
        self.first_free_inode += INODE_SIZE as i64;
        log::debug!("allocated inode {index}");
        Ok(index)
    }

    /// Allocate the lowest free block. The caller writes the block record.
    pub fn find_next_free_block<F>(&mut self, file: &mut F) -> Result<i32>
    where
        F: Read + Write + Seek,
    {
        let index = bitmap::find_and_mark(
            file,
            self.bitmap_block_start as u64,
            self.block_capacity(),
            "block",
        )?;
        self.block_count += 1;
        self.free_block_count -= 1;
        self.first_free_block += BLOCK_SIZE as i64;
        log::debug!("allocated block {index}");
        Ok(index)
    }

    /// Allocate a block into pointer slot `slot` of `inode`. The slot must
    /// be within the pointer array and still unused.
    pub fn assign_new_block<F>(&mut self, file: &mut F, inode: &mut Inode, slot: usize) -> Result<i32>
    where
        F: Read + Write + Seek,
    {
        if slot >= inode.pointers.len() {
            return Err(FsError::Parameter(format!(
                "pointer slot {slot} is out of range"
            )));
        }
        if inode.pointers[slot] != -1 {
            return Err(FsError::Parameter(format!(
                "pointer slot {slot} is already occupied by block {}",
                inode.pointers[slot]
            )));
        }
        let index = self.find_next_free_block(file)?;
        inode.pointers[slot] = index;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::measured_width;
    use std::io::Cursor;

    #[test]
    fn record_width_is_pinned() {
        let sb = Superblock::new(0, 512 * 1024).unwrap();
        assert_eq!(measured_width(&sb), Superblock::WIDTH);
    }

    #[test]
    fn layout_regions_are_ordered_and_sized() {
        let part_start = 193;
        let part_size = 500 * 1024;
        let sb = Superblock::new(part_start, part_size).unwrap();
        let n = (part_size - 100) / (1 + 104 + 3 * 64);
        assert_eq!(sb.inode_capacity() as i64, n);
        assert_eq!(sb.block_capacity() as i64, 3 * n);
        assert_eq!(sb.self_offset(), part_start as u64);
        assert_eq!(sb.bitmap_inode_start, part_start + 100);
        assert_eq!(
            sb.bitmap_block_start - sb.bitmap_inode_start,
            bitmap::byte_len(n as i32) as i64
        );
        assert_eq!(sb.inode_offset(0), sb.inode_start as u64);
        assert_eq!(sb.block_offset(2) - sb.block_offset(0), 128);
        // the last block ends within the partition
        let end = sb.block_start + 3 * n * 64;
        assert!(end <= part_start + part_size);
    }

    #[test]
    fn allocation_keeps_capacity_sums_constant() {
        let mut sb = Superblock::new(0, 64 * 1024).unwrap();
        let mut image = Cursor::new(vec![0u8; 64 * 1024]);
        bitmap::init(&mut image, sb.bitmap_inode_start as u64, sb.inode_capacity()).unwrap();
        bitmap::init(&mut image, sb.bitmap_block_start as u64, sb.block_capacity()).unwrap();

        let n = sb.inode_capacity();
        let blocks = sb.block_capacity();
        for expected in 0..4 {
            assert_eq!(sb.find_next_free_inode(&mut image).unwrap(), expected);
            assert_eq!(sb.find_next_free_block(&mut image).unwrap(), expected);
            assert_eq!(sb.inode_count + sb.free_inode_count, n);
            assert_eq!(sb.block_count + sb.free_block_count, blocks);
        }
        assert_eq!(sb.first_free_inode, sb.inode_start + 4 * 104);
        assert_eq!(sb.first_free_block, sb.block_start + 4 * 64);
    }

    #[test]
    fn assign_new_block_guards_the_slot() {
        let mut sb = Superblock::new(0, 64 * 1024).unwrap();
        let mut image = Cursor::new(vec![0u8; 64 * 1024]);
        bitmap::init(&mut image, sb.bitmap_block_start as u64, sb.block_capacity()).unwrap();

        let mut inode = Inode::new(crate::fs::inode::KIND_DIRECTORY, 1, 1, 0);
        let block = sb.assign_new_block(&mut image, &mut inode, 0).unwrap();
        assert_eq!(inode.pointers[0], block);
        assert!(matches!(
            sb.assign_new_block(&mut image, &mut inode, 0),
            Err(FsError::Parameter(_))
        ));
        assert!(matches!(
            sb.assign_new_block(&mut image, &mut inode, 15),
            Err(FsError::Parameter(_))
        ));
    }

    #[test]
    fn tiny_partition_is_rejected() {
        assert!(matches!(
            Superblock::new(0, 400),
            Err(FsError::NoSpace(_))
        ));
    }
}
