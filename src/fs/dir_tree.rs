//! Directory tree engine: path walks, directory/file creation and file
//! content I/O.
//!
//! Creation takes an ordered list of parent component names plus a final
//! destination name. With no parents the destination lands under the root;
//! otherwise the walk is attempted from every inode index in turn, and the
//! first inode whose subtree matches the whole parent chain receives the
//! child. The walk itself is iterative over path components.

use std::io::{Read, Seek, Write};

use crate::codec::DiskRecord;
use crate::error::{FsError, Result};
use crate::fs::block::CHILD_ENTRY_START;
use crate::fs::inode::{KIND_DIRECTORY, KIND_FILE};
use crate::fs::{
    DirectoryBlock, DirectoryEntry, FileBlock, Inode, PointerBlock, Superblock, BLOCK_SIZE,
    DIRECT_POINTERS, POINTERS_PER_BLOCK, ROOT_INODE, SINGLE_INDIRECT_SLOT,
};

enum NewNode {
    Directory,
    File(Vec<u8>),
}

/// Create a directory named `name` under the path given by `parents`.
/// Returns the new inode index.
pub fn create_directory<F>(
    file: &mut F,
    sb: &mut Superblock,
    parents: &[String],
    name: &str,
) -> Result<i32>
where
    F: Read + Write + Seek,
{
    create_node(file, sb, parents, name, NewNode::Directory)
}

/// Create a file named `name` under the path given by `parents`. When
/// `content` is empty and `size` is positive, the payload is the digit
/// cycle `0123456789...` truncated to `size` bytes.
pub fn create_file<F>(
    file: &mut F,
    sb: &mut Superblock,
    parents: &[String],
    name: &str,
    size: usize,
    content: &str,
) -> Result<i32>
where
    F: Read + Write + Seek,
{
    let payload = if content.is_empty() {
        generate_content(size)
    } else {
        content.as_bytes().to_vec()
    };
    create_node(file, sb, parents, name, NewNode::File(payload))
}

/// Digit-cycle payload for files created by size alone.
pub fn generate_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| b'0' + (i % 10) as u8).collect()
}

/// Resolve an absolute path (components from the root) to an inode index.
/// Read-only; `Ok(None)` when some component does not match.
pub fn resolve<F>(file: &mut F, sb: &Superblock, components: &[String]) -> Result<Option<i32>>
where
    F: Read + Seek,
{
    walk_from(file, sb, ROOT_INODE, components)
}

fn create_node<F>(
    file: &mut F,
    sb: &mut Superblock,
    parents: &[String],
    name: &str,
    node: NewNode,
) -> Result<i32>
where
    F: Read + Write + Seek,
{
    if parents.is_empty() {
        return attach(file, sb, ROOT_INODE, name, node);
    }
    // not a root-only descent: any inode whose subtree matches the whole
    // parent chain may receive the child
    for start in 0..sb.inode_count {
        if let Some(parent_index) = walk_from(file, sb, start, parents)? {
            return attach(file, sb, parent_index, name, node);
        }
    }
    Err(FsError::NotFound(format!(
        "path {:?} does not exist",
        parents.join("/")
    )))
}

/// Follow `components` starting at inode `start`. `Ok(None)` when a
/// component has no match under the current inode.
fn walk_from<F>(
    file: &mut F,
    sb: &Superblock,
    start: i32,
    components: &[String],
) -> Result<Option<i32>>
where
    F: Read + Seek,
{
    let mut current = start;
    for component in components {
        let inode = Inode::decode(file, sb.inode_offset(current))?;
        if !inode.is_directory() {
            return Ok(None);
        }
        match find_child(file, sb, &inode, component)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Scan a directory inode's blocks (up to the first unused pointer) for a
/// child named `name`.
fn find_child<F>(file: &mut F, sb: &Superblock, inode: &Inode, name: &str) -> Result<Option<i32>>
where
    F: Read + Seek,
{
    for &pointer in &inode.pointers[..DIRECT_POINTERS] {
        if pointer == -1 {
            break;
        }
        let block = DirectoryBlock::decode(file, sb.block_offset(pointer))?;
        if let Some(child) = block.find_child(name) {
            return Ok(Some(child));
        }
    }
    Ok(None)
}

/// Place a new child named `name` under the directory at `parent_index`.
fn attach<F>(
    file: &mut F,
    sb: &mut Superblock,
    parent_index: i32,
    name: &str,
    node: NewNode,
) -> Result<i32>
where
    F: Read + Write + Seek,
{
    let mut parent = Inode::decode(file, sb.inode_offset(parent_index))?;
    if !parent.is_directory() {
        return Err(FsError::Parameter(format!(
            "inode {parent_index} is not a directory"
        )));
    }
    if find_child(file, sb, &parent, name)?.is_some() {
        return Err(FsError::AlreadyExists(format!(
            "{name:?} already exists in inode {parent_index}"
        )));
    }

    // first empty entry across the existing blocks
    let mut placement: Option<(i32, usize)> = None;
    for &pointer in &parent.pointers[..DIRECT_POINTERS] {
        if pointer == -1 {
            break;
        }
        let block = DirectoryBlock::decode(file, sb.block_offset(pointer))?;
        if let Some(entry_index) = block.first_empty_slot() {
            placement = Some((pointer, entry_index));
            break;
        }
    }
    let (block_index, entry_index) = match placement {
        Some(found) => found,
        // every existing block is full: extend the directory with a fresh
        // block in the next free direct pointer
        None => {
            let slot = parent.first_free_direct().ok_or_else(|| {
                FsError::NoSpace(format!(
                    "directory inode {parent_index} has no direct pointer left"
                ))
            })?;
            let first_block =
                DirectoryBlock::decode(file, sb.block_offset(parent.pointers[0]))?;
            let grandparent = first_block.parent_inode();
            let new_block = sb.assign_new_block(file, &mut parent, slot)?;
            DirectoryBlock::new(parent_index, grandparent)
                .encode(file, sb.block_offset(new_block))?;
            (new_block, CHILD_ENTRY_START)
        }
    };

    let child_index = sb.find_next_free_inode(file)?;
    let mut block = DirectoryBlock::decode(file, sb.block_offset(block_index))?;
    block.entries[entry_index] = DirectoryEntry::new(name, child_index)?;
    block.encode(file, sb.block_offset(block_index))?;

    match node {
        NewNode::Directory => {
            let mut child = Inode::new(KIND_DIRECTORY, 1, 1, 0);
            let child_block = sb.assign_new_block(file, &mut child, 0)?;
            DirectoryBlock::new(child_index, parent_index)
                .encode(file, sb.block_offset(child_block))?;
            child.encode(file, sb.inode_offset(child_index))?;
            log::info!("created directory {name:?} as inode {child_index}");
        }
        NewNode::File(payload) => {
            let mut child = Inode::new(KIND_FILE, 1, 1, payload.len() as i64);
            write_payload(file, sb, &mut child, &payload)?;
            child.encode(file, sb.inode_offset(child_index))?;
            log::info!(
                "created file {name:?} as inode {child_index} ({} bytes)",
                payload.len()
            );
        }
    }

    parent.touch_modified();
    parent.encode(file, sb.inode_offset(parent_index))?;
    sb.encode(file, sb.self_offset())?;
    Ok(child_index)
}

/// Concatenated content of the file at `inode_index`, trailing zero bytes
/// trimmed. Read-only: neither the inode nor the superblock is touched.
pub fn read_file_content<F>(file: &mut F, sb: &Superblock, inode_index: i32) -> Result<Vec<u8>>
where
    F: Read + Seek,
{
    let inode = Inode::decode(file, sb.inode_offset(inode_index))?;
    if !inode.is_file() {
        return Err(FsError::Parameter(format!(
            "inode {inode_index} is not a file"
        )));
    }
    let mut content = Vec::new();
    for &pointer in &inode.pointers[..DIRECT_POINTERS] {
        if pointer == -1 {
            break;
        }
        let block = FileBlock::decode(file, sb.block_offset(pointer))?;
        content.extend_from_slice(&block.content);
    }
    if inode.pointers[SINGLE_INDIRECT_SLOT] != -1 {
        let indirect =
            PointerBlock::decode(file, sb.block_offset(inode.pointers[SINGLE_INDIRECT_SLOT]))?;
        for &pointer in &indirect.pointers {
            if pointer == -1 {
                break;
            }
            let block = FileBlock::decode(file, sb.block_offset(pointer))?;
            content.extend_from_slice(&block.content);
        }
    }
    let end = content.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    content.truncate(end);
    Ok(content)
}

/// Replace the content of the file at `inode_index`, reusing its blocks
/// and allocating more when the payload outgrows them.
pub fn write_file_content<F>(
    file: &mut F,
    sb: &mut Superblock,
    inode_index: i32,
    payload: &[u8],
) -> Result<()>
where
    F: Read + Write + Seek,
{
    let mut inode = Inode::decode(file, sb.inode_offset(inode_index))?;
    if !inode.is_file() {
        return Err(FsError::Parameter(format!(
            "inode {inode_index} is not a file"
        )));
    }
    write_payload(file, sb, &mut inode, payload)?;
    inode.touch_modified();
    inode.encode(file, sb.inode_offset(inode_index))?;
    sb.encode(file, sb.self_offset())?;
    Ok(())
}

/// Write `payload` into `inode`'s blocks in 64-byte chunks: direct
/// pointers first, then the single-indirect block. Surplus blocks from a
/// longer previous content are zeroed, not released.
fn write_payload<F>(
    file: &mut F,
    sb: &mut Superblock,
    inode: &mut Inode,
    payload: &[u8],
) -> Result<()>
where
    F: Read + Write + Seek,
{
    let chunk_count = payload.len().div_ceil(BLOCK_SIZE);
    let capacity = DIRECT_POINTERS + POINTERS_PER_BLOCK;
    if chunk_count > capacity {
        return Err(FsError::NoSpace(format!(
            "content of {} bytes exceeds the file capacity of {} bytes",
            payload.len(),
            capacity * BLOCK_SIZE
        )));
    }

    let mut indirect: Option<(i32, PointerBlock)> = match inode.pointers[SINGLE_INDIRECT_SLOT] {
        -1 => None,
        index => Some((index, PointerBlock::decode(file, sb.block_offset(index))?)),
    };

    for chunk_index in 0..capacity {
        let block_index = if chunk_index < DIRECT_POINTERS {
            if inode.pointers[chunk_index] != -1 {
                inode.pointers[chunk_index]
            } else if chunk_index < chunk_count {
                sb.assign_new_block(file, inode, chunk_index)?
            } else {
                break;
            }
        } else {
            let slot = chunk_index - DIRECT_POINTERS;
            let existing = indirect
                .as_ref()
                .map(|(_, pointer_block)| pointer_block.pointers[slot])
                .filter(|&index| index != -1);
            match existing {
                Some(index) => index,
                None if chunk_index >= chunk_count => break,
                None => {
                    if indirect.is_none() {
                        let index = sb.assign_new_block(file, inode, SINGLE_INDIRECT_SLOT)?;
                        indirect = Some((index, PointerBlock::empty()));
                    }
                    let data_index = sb.find_next_free_block(file)?;
                    if let Some((_, pointer_block)) = &mut indirect {
                        pointer_block.pointers[slot] = data_index;
                    }
                    data_index
                }
            }
        };

        let chunk = if chunk_index < chunk_count {
            let start = chunk_index * BLOCK_SIZE;
            &payload[start..payload.len().min(start + BLOCK_SIZE)]
        } else {
            // stale block from a longer previous content
            &[]
        };
        FileBlock::from_chunk(chunk).encode(file, sb.block_offset(block_index))?;
    }

    if let Some((index, pointer_block)) = indirect {
        pointer_block.encode(file, sb.block_offset(index))?;
    }
    inode.size = payload.len() as i64;
    Ok(())
}
