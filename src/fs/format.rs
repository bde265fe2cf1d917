//! Formatting a partition: superblock, bitmaps, root directory and the
//! account file.

use std::io::{Read, Seek, Write};

use crate::codec::DiskRecord;
use crate::error::Result;
use crate::fs::inode::{KIND_DIRECTORY, KIND_FILE};
use crate::fs::{
    bitmap, DirectoryBlock, DirectoryEntry, FileBlock, Inode, Superblock, ACCOUNTS_FILE_NAME,
    INITIAL_ACCOUNTS,
};
use crate::utils::units;

/// Format the partition at `part_start`. Lays out the superblock and the
/// zeroed bitmaps, then allocates the root directory as inode 0 and the
/// account file as inode 1 through the regular allocation path, so the
/// counters reflect both.
pub fn format<F>(file: &mut F, part_start: i64, part_size: i64) -> Result<Superblock>
where
    F: Read + Write + Seek,
{
    let mut sb = Superblock::new(part_start, part_size)?;
    bitmap::init(file, sb.bitmap_inode_start as u64, sb.inode_capacity())?;
    bitmap::init(file, sb.bitmap_block_start as u64, sb.block_capacity())?;

    // root directory
    let root_inode_index = sb.find_next_free_inode(file)?;
    let root_block_index = sb.find_next_free_block(file)?;
    let mut root = Inode::new(KIND_DIRECTORY, 1, 1, 0);
    root.pointers[0] = root_block_index;
    let mut root_block = DirectoryBlock::new(root_inode_index, root_inode_index);

    // account file, linked as the root's first child
    let users_inode_index = sb.find_next_free_inode(file)?;
    let users_block_index = sb.find_next_free_block(file)?;
    let text = INITIAL_ACCOUNTS.as_bytes();
    let mut users = Inode::new(KIND_FILE, 1, 1, text.len() as i64);
    users.pointers[0] = users_block_index;
    root_block.entries[2] = DirectoryEntry::new(ACCOUNTS_FILE_NAME, users_inode_index)?;

    root.encode(file, sb.inode_offset(root_inode_index))?;
    root_block.encode(file, sb.block_offset(root_block_index))?;
    users.encode(file, sb.inode_offset(users_inode_index))?;
    FileBlock::from_chunk(text).encode(file, sb.block_offset(users_block_index))?;
    sb.encode(file, part_start as u64)?;

    log::info!(
        "formatted partition at offset {part_start} ({}): {} inodes, {} blocks",
        units::display_bytes(part_size),
        sb.inode_capacity(),
        sb.block_capacity()
    );
    Ok(sb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{ACCOUNTS_INODE, ROOT_INODE};
    use std::io::Cursor;

    fn formatted(part_size: i64) -> (Cursor<Vec<u8>>, Superblock) {
        let mut image = Cursor::new(vec![0u8; part_size as usize]);
        let sb = format(&mut image, 0, part_size).unwrap();
        (image, sb)
    }

    #[test]
    fn root_and_account_file_are_fixed_inodes() {
        let (mut image, sb) = formatted(64 * 1024);
        assert_eq!(sb.inode_count, 2);
        assert_eq!(sb.block_count, 2);

        let root = Inode::decode(&mut image, sb.inode_offset(ROOT_INODE)).unwrap();
        assert!(root.is_directory());
        let root_block = DirectoryBlock::decode(&mut image, sb.block_offset(root.pointers[0])).unwrap();
        assert_eq!(root_block.entries[0].inode, ROOT_INODE);
        assert_eq!(root_block.parent_inode(), ROOT_INODE);
        assert_eq!(root_block.find_child(ACCOUNTS_FILE_NAME), Some(ACCOUNTS_INODE));

        let users = Inode::decode(&mut image, sb.inode_offset(ACCOUNTS_INODE)).unwrap();
        assert!(users.is_file());
        assert_eq!(users.size, INITIAL_ACCOUNTS.len() as i64);
        let block = FileBlock::decode(&mut image, sb.block_offset(users.pointers[0])).unwrap();
        assert_eq!(block.trimmed(), INITIAL_ACCOUNTS.as_bytes());
    }

    #[test]
    fn formatting_twice_yields_identical_counters() {
        let (_, first) = formatted(128 * 1024);
        let (mut image, second) = formatted(128 * 1024);
        assert_eq!(first.inode_count, second.inode_count);
        assert_eq!(first.free_inode_count, second.free_inode_count);
        assert_eq!(first.block_count, second.block_count);
        assert_eq!(first.free_block_count, second.free_block_count);

        // reformatting an already used image resets the counters too
        let again = format(&mut image, 0, 128 * 1024).unwrap();
        assert_eq!(again.free_inode_count, second.free_inode_count);
        assert_eq!(again.free_block_count, second.free_block_count);
    }

    #[test]
    fn superblock_persists_at_partition_start() {
        let (mut image, sb) = formatted(64 * 1024);
        let stored = Superblock::decode(&mut image, 0).unwrap();
        assert_eq!(stored, sb);
        assert!(stored.is_formatted());
    }
}
