//! Full scenario against a real image file: disk, partitions, mount,
//! format, accounts and a directory tree.

use std::path::PathBuf;

use anyhow::Result;

use vdisk::codec::DiskRecord;
use vdisk::commands;
use vdisk::disk::{Fit, Mbr, PartitionKind};
use vdisk::fs::{
    dir_tree, report, AccountKind, DirectoryBlock, Inode, Registry, Superblock, ACCOUNTS_FILE_NAME,
    ACCOUNTS_INODE, BLOCKS_PER_INODE, BLOCK_SIZE, INODE_SIZE, ROOT_INODE, SUPERBLOCK_SIZE,
};
use vdisk::session::Context;
use vdisk::utils::units::SizeUnit;

fn temp_disk(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("vdisk-e2e-{}-{name}.bin", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn one_megabyte_disk_lifecycle() -> Result<()> {
    init_logging();
    let path = temp_disk("lifecycle");
    let mut ctx = Context::new();

    commands::create_disk(&path, 1, SizeUnit::Mega, Fit::First)?;
    commands::create_partition(
        &path,
        500,
        SizeUnit::Kilo,
        Fit::First,
        PartitionKind::Primary,
        "Part1",
    )?;
    let id = commands::mount(&mut ctx, &path, "Part1")?;
    assert_eq!(id, "461A");

    let sb = commands::format(&ctx, &id)?;
    let part_size = 500 * 1024i64;
    let n = (part_size - SUPERBLOCK_SIZE as i64)
        / (1 + INODE_SIZE as i64 + BLOCKS_PER_INODE as i64 * BLOCK_SIZE as i64);
    assert_eq!(sb.inode_capacity() as i64, n);
    assert_eq!(sb.block_capacity() as i64, 3 * n);
    // the root directory and the account file are already allocated
    assert_eq!(sb.free_inode_count as i64, n - 2);
    assert_eq!(sb.free_block_count as i64, 3 * n - 2);

    // the mount id is persisted into the partition entry
    let mut file = std::fs::File::open(&path)?;
    let mbr = Mbr::decode(&mut file, 0)?;
    let slot = mbr.find_by_id(&id)?;
    assert_eq!(mbr.partitions[slot].correlative, 1);
    assert!(mbr.partitions[slot].is_mounted());

    // inode 0 is a directory whose first block names the account file
    let root = Inode::decode(&mut file, sb.inode_offset(ROOT_INODE))?;
    assert!(root.is_directory());
    let root_block = DirectoryBlock::decode(&mut file, sb.block_offset(root.pointers[0]))?;
    assert_eq!(root_block.find_child(ACCOUNTS_FILE_NAME), Some(ACCOUNTS_INODE));

    commands::remove_disk(&path)?;
    Ok(())
}

#[test]
fn accounts_and_directories_over_a_session() -> Result<()> {
    init_logging();
    let path = temp_disk("session");
    let mut ctx = Context::new();

    commands::create_disk(&path, 1, SizeUnit::Mega, Fit::Worst)?;
    commands::create_partition(
        &path,
        300,
        SizeUnit::Kilo,
        Fit::Worst,
        PartitionKind::Primary,
        "sys",
    )?;
    let id = commands::mount(&mut ctx, &path, "sys")?;
    commands::format(&ctx, &id)?;

    // privileged commands are rejected without a session
    assert!(commands::make_group(&ctx, "admins").is_err());
    assert!(commands::login(&mut ctx, "root", "wrong", &id).is_err());
    commands::login(&mut ctx, "root", "123", &id)?;

    commands::make_group(&ctx, "admins")?;
    commands::make_user(&ctx, "alice", "pw", "admins")?;
    // a user cannot join a group that does not exist
    assert!(commands::make_user(&ctx, "bob", "pw", "ghosts").is_err());

    commands::make_directory(&ctx, "/a/b/c", true)?;
    commands::make_directory(&ctx, "/a/b/d", false)?;
    commands::make_file(&ctx, "/a/readme", 0, "hello")?;

    let (mut file, _, sb) = reopen(&ctx, &id)?;

    let registry = Registry::load(&mut file, &sb)?;
    assert_eq!(registry.find("alice", AccountKind::User)?.group, "admins");

    let comps: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let c = dir_tree::resolve(&mut file, &sb, &comps)?.expect("path exists");
    let b = dir_tree::resolve(&mut file, &sb, &comps[..2])?.expect("path exists");
    let c_inode = Inode::decode(&mut file, sb.inode_offset(c))?;
    let c_block = DirectoryBlock::decode(&mut file, sb.block_offset(c_inode.pointers[0]))?;
    assert_eq!(c_block.parent_inode(), b);

    let readme: Vec<String> = ["a", "readme"].iter().map(|s| s.to_string()).collect();
    let f = dir_tree::resolve(&mut file, &sb, &readme)?.expect("file exists");
    assert_eq!(dir_tree::read_file_content(&mut file, &sb, f)?, b"hello");

    // every used inode keeps its pointers within the block table
    let inodes = report::enumerate_inodes(&mut file, &sb)?;
    assert!(inodes
        .iter()
        .all(|r| r.inode.pointers_in_range(sb.block_capacity())));
    assert_eq!(sb.inode_count as usize, inodes.len());

    // soft delete excludes alice from lookups
    commands::remove_user(&ctx, "alice")?;
    let (mut file, _, sb2) = reopen(&ctx, &id)?;
    let after = Registry::load(&mut file, &sb2)?;
    assert!(after.find("alice", AccountKind::User).is_err());

    commands::logout(&mut ctx)?;
    assert!(commands::logout(&mut ctx).is_err());

    commands::remove_disk(&path)?;
    Ok(())
}

#[test]
fn logical_partitions_chain_inside_an_extended() -> Result<()> {
    init_logging();
    let path = temp_disk("logical");

    commands::create_disk(&path, 1, SizeUnit::Mega, Fit::First)?;
    commands::create_partition(
        &path,
        600,
        SizeUnit::Kilo,
        Fit::First,
        PartitionKind::Extended,
        "ext",
    )?;
    for name in ["l1", "l2", "l3"] {
        commands::create_partition(
            &path,
            150,
            SizeUnit::Kilo,
            Fit::First,
            PartitionKind::Logical,
            name,
        )?;
    }
    // 150K remain inside the extended partition
    let err = commands::create_partition(
        &path,
        200,
        SizeUnit::Kilo,
        Fit::First,
        PartitionKind::Logical,
        "l4",
    )
    .unwrap_err();
    assert!(matches!(err, vdisk::FsError::NoSpace(_)));

    let mut file = std::fs::File::open(&path)?;
    let mbr = Mbr::decode(&mut file, 0)?;
    let extended = mbr.extended().expect("extended exists");
    let (tail, _) = vdisk::disk::ebr::find_last_ebr(&mut file, extended.start)?;
    assert_eq!(tail.name_str(), "l3");
    assert_eq!(tail.next, -1);

    commands::remove_disk(&path)?;
    Ok(())
}

fn reopen(ctx: &Context, id: &str) -> Result<(std::fs::File, i64, Superblock)> {
    let mounted = ctx.mounts.get(id)?.clone();
    let mut file = std::fs::File::open(&mounted.path)?;
    let mbr = Mbr::decode(&mut file, 0)?;
    let part = mbr.partitions[mbr.find_by_id(id)?];
    let sb = Superblock::decode(&mut file, part.start as u64)?;
    Ok((file, part.start, sb))
}
