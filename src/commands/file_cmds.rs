//! Directory and file creation commands. Both operate on the partition of
//! the active session.

use crate::error::{FsError, Result};
use crate::fs::dir_tree;
use crate::session::Context;

/// Split an absolute path into its components.
pub(crate) fn split_path(path: &str) -> Result<Vec<String>> {
    let trimmed = path.trim();
    if !trimmed.starts_with('/') {
        return Err(FsError::Parameter(format!(
            "path must be absolute, got {path:?}"
        )));
    }
    let components: Vec<String> = trimmed
        .split('/')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if components.is_empty() {
        return Err(FsError::Parameter("path names no component".into()));
    }
    Ok(components)
}

/// Create the directory at `path`. With `create_parents`, missing
/// ancestors are created in order first; without it, the parents must
/// already exist somewhere in the tree.
pub fn make_directory(ctx: &Context, path: &str, create_parents: bool) -> Result<()> {
    let session = ctx.active_session()?;
    log::info!("make_directory {path:?} create_parents={create_parents}");
    let (mut file, _, mut sb) = super::mounted_filesystem(ctx, &session.mount_id)?;
    let components = split_path(path)?;
    if create_parents {
        for end in 1..=components.len() {
            if dir_tree::resolve(&mut file, &sb, &components[..end])?.is_none() {
                dir_tree::create_directory(
                    &mut file,
                    &mut sb,
                    &components[..end - 1],
                    &components[end - 1],
                )?;
            }
        }
    } else {
        let (parents, dest) = components.split_at(components.len() - 1);
        dir_tree::create_directory(&mut file, &mut sb, parents, &dest[0])?;
    }
    Ok(())
}

/// Create the file at `path`. A non-empty `content` becomes the payload;
/// otherwise `size` bytes of the digit cycle are generated. Parent
/// directories must already exist.
pub fn make_file(ctx: &Context, path: &str, size: usize, content: &str) -> Result<()> {
    let session = ctx.active_session()?;
    log::info!("make_file {path:?} size={size}");
    let (mut file, _, mut sb) = super::mounted_filesystem(ctx, &session.mount_id)?;
    let components = split_path(path)?;
    let (parents, dest) = components.split_at(components.len() - 1);
    dir_tree::create_file(&mut file, &mut sb, parents, &dest[0], size, content)?;
    Ok(())
}
