//! The simplified on-disk filesystem: superblock, bitmaps, inode/block
//! layer, directory tree engine and account registry.

pub mod accounts;
pub mod bitmap;
pub mod block;
pub mod dir_tree;
pub mod format;
pub mod inode;
pub mod report;
pub mod superblock;

pub use accounts::{AccountKind, AccountRow, Registry};
pub use block::{DirectoryBlock, DirectoryEntry, FileBlock, PointerBlock};
pub use inode::Inode;
pub use superblock::Superblock;

/// Identifies a formatted partition.
pub const MAGIC: u32 = 0xEF53;
/// Filesystem revision stamped into the superblock.
pub const FS_TYPE: i32 = 2;

/// Every block kind encodes to this width.
pub const BLOCK_SIZE: usize = 64;
pub const INODE_SIZE: usize = 104;
pub const SUPERBLOCK_SIZE: usize = 100;

/// Pointer slots per inode: 12 direct, then single/double/triple indirect.
pub const POINTERS_PER_INODE: usize = 15;
pub const DIRECT_POINTERS: usize = 12;
/// Slot of the single-indirect pointer block.
pub const SINGLE_INDIRECT_SLOT: usize = 12;
/// Pointers held by one [PointerBlock].
pub const POINTERS_PER_BLOCK: usize = 16;

/// Blocks reserved per inode by the capacity formula.
pub const BLOCKS_PER_INODE: i32 = 3;

/// The root directory, fixed at format time.
pub const ROOT_INODE: i32 = 0;
/// The account registry file, fixed at format time.
pub const ACCOUNTS_INODE: i32 = 1;
pub const ACCOUNTS_FILE_NAME: &str = "users.txt";
/// Registry content written at format time: the root group and the root
/// user.
pub const INITIAL_ACCOUNTS: &str = "1,G,root\n1,U,root,root,123\n";
