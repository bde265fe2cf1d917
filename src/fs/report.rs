//! Read-only enumeration of a formatted partition for the reporting
//! layer. Nothing here mutates bitmaps, the superblock or inode times.

use std::io::{Read, Seek};

use crate::codec::DiskRecord;
use crate::error::Result;
use crate::fs::{
    bitmap, DirectoryBlock, FileBlock, Inode, PointerBlock, Superblock, DIRECT_POINTERS,
    SINGLE_INDIRECT_SLOT,
};

#[derive(Debug, Clone, PartialEq)]
pub struct InodeReport {
    pub index: i32,
    pub inode: Inode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Directory(DirectoryBlock),
    File(FileBlock),
    Pointer(PointerBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockReport {
    /// Inode the block belongs to.
    pub inode_index: i32,
    pub index: i32,
    pub content: BlockContent,
}

/// Decode every inode the inode bitmap marks used, in index order.
pub fn enumerate_inodes<F>(file: &mut F, sb: &Superblock) -> Result<Vec<InodeReport>>
where
    F: Read + Seek,
{
    let bits = bitmap::load(file, sb.bitmap_inode_start as u64, sb.inode_capacity())?;
    let mut reports = Vec::new();
    for index in bits.iter_ones() {
        let index = index as i32;
        let inode = Inode::decode(file, sb.inode_offset(index))?;
        reports.push(InodeReport { index, inode });
    }
    Ok(reports)
}

/// Decode every block reachable from a used inode, typed by the owning
/// inode: directory inodes yield directory blocks, file inodes yield file
/// blocks plus their single-indirect pointer block.
pub fn enumerate_blocks<F>(file: &mut F, sb: &Superblock) -> Result<Vec<BlockReport>>
where
    F: Read + Seek,
{
    let mut reports = Vec::new();
    for InodeReport { index, inode } in enumerate_inodes(file, sb)? {
        for &pointer in &inode.pointers[..DIRECT_POINTERS] {
            if pointer == -1 {
                break;
            }
            let content = if inode.is_directory() {
                BlockContent::Directory(DirectoryBlock::decode(file, sb.block_offset(pointer))?)
            } else {
                BlockContent::File(FileBlock::decode(file, sb.block_offset(pointer))?)
            };
            reports.push(BlockReport {
                inode_index: index,
                index: pointer,
                content,
            });
        }
        let indirect = inode.pointers[SINGLE_INDIRECT_SLOT];
        if indirect != -1 {
            let pointer_block = PointerBlock::decode(file, sb.block_offset(indirect))?;
            reports.push(BlockReport {
                inode_index: index,
                index: indirect,
                content: BlockContent::Pointer(pointer_block),
            });
            for &pointer in &pointer_block.pointers {
                if pointer == -1 {
                    break;
                }
                reports.push(BlockReport {
                    inode_index: index,
                    index: pointer,
                    content: BlockContent::File(FileBlock::decode(file, sb.block_offset(pointer))?),
                });
            }
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::format::format;
    use crate::fs::{dir_tree, ACCOUNTS_INODE, ROOT_INODE};
    use std::io::Cursor;

    #[test]
    fn enumeration_reflects_the_tree_and_mutates_nothing() {
        let size = 128 * 1024;
        let mut image = Cursor::new(vec![0u8; size as usize]);
        let mut sb = format(&mut image, 0, size).unwrap();
        dir_tree::create_directory(&mut image, &mut sb, &[], "home").unwrap();

        let before = image.get_ref().clone();
        let inodes = enumerate_inodes(&mut image, &sb).unwrap();
        let blocks = enumerate_blocks(&mut image, &sb).unwrap();
        assert_eq!(image.get_ref(), &before);

        assert_eq!(inodes.len(), 3);
        assert_eq!(inodes[0].index, ROOT_INODE);
        assert!(inodes[0].inode.is_directory());
        assert_eq!(inodes[1].index, ACCOUNTS_INODE);
        assert!(inodes[1].inode.is_file());
        assert!(inodes
            .iter()
            .all(|r| r.inode.pointers_in_range(sb.block_capacity())));

        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0].content, BlockContent::Directory(_)));
        assert!(matches!(blocks[1].content, BlockContent::File(_)));
    }
}
