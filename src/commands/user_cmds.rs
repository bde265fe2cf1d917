//! Session and account commands. Everything past login requires an active
//! session; the group/user mutations additionally require root.

use crate::error::{FsError, Result};
use crate::fs::{AccountKind, AccountRow, Registry};
use crate::session::{Context, Session};

/// Authenticate against the registry of the mounted partition `mount_id`
/// and open the session. Only one session can be active at a time.
pub fn login(ctx: &mut Context, user: &str, password: &str, mount_id: &str) -> Result<()> {
    if let Some(active) = &ctx.session {
        return Err(FsError::AlreadyExists(format!(
            "a session for {:?} is already active",
            active.user
        )));
    }
    let (mut file, _, sb) = super::mounted_filesystem(ctx, mount_id)?;
    let registry = Registry::load(&mut file, &sb)?;
    let row = registry.find(user, AccountKind::User)?;
    if row.password != password {
        return Err(FsError::PermissionDenied(format!(
            "wrong password for user {user:?}"
        )));
    }
    ctx.session = Some(Session {
        user: user.to_string(),
        group: row.group.clone(),
        mount_id: mount_id.to_string(),
    });
    log::info!("logged in {user:?} on {mount_id}");
    Ok(())
}

pub fn logout(ctx: &mut Context) -> Result<()> {
    let session = ctx
        .session
        .take()
        .ok_or_else(|| FsError::PermissionDenied("no active session".into()))?;
    log::info!("logged out {:?}", session.user);
    Ok(())
}

/// Load the registry of the root session's partition for a privileged
/// mutation.
fn root_registry(ctx: &Context) -> Result<(std::fs::File, crate::fs::Superblock, Registry)> {
    let session = ctx.require_root()?;
    let (mut file, _, sb) = super::mounted_filesystem(ctx, &session.mount_id)?;
    let registry = Registry::load(&mut file, &sb)?;
    Ok((file, sb, registry))
}

pub fn make_group(ctx: &Context, name: &str) -> Result<()> {
    log::info!("make_group {name:?}");
    let (mut file, mut sb, mut registry) = root_registry(ctx)?;
    let row = AccountRow::group(registry.next_id(), name);
    registry.add(row)?;
    registry.save(&mut file, &mut sb)
}

pub fn remove_group(ctx: &Context, name: &str) -> Result<()> {
    log::info!("remove_group {name:?}");
    let (mut file, mut sb, mut registry) = root_registry(ctx)?;
    registry.remove(name, AccountKind::Group)?;
    registry.save(&mut file, &mut sb)
}

/// Create a user in an existing group.
pub fn make_user(ctx: &Context, user: &str, password: &str, group: &str) -> Result<()> {
    log::info!("make_user {user:?} group={group:?}");
    let (mut file, mut sb, mut registry) = root_registry(ctx)?;
    registry.find(group, AccountKind::Group)?;
    let row = AccountRow::user(registry.next_id(), group, user, password);
    registry.add(row)?;
    registry.save(&mut file, &mut sb)
}

pub fn remove_user(ctx: &Context, user: &str) -> Result<()> {
    log::info!("remove_user {user:?}");
    let (mut file, mut sb, mut registry) = root_registry(ctx)?;
    registry.remove(user, AccountKind::User)?;
    registry.save(&mut file, &mut sb)
}

/// Move a user to another existing group.
pub fn change_group(ctx: &Context, user: &str, group: &str) -> Result<()> {
    log::info!("change_group {user:?} -> {group:?}");
    let (mut file, mut sb, mut registry) = root_registry(ctx)?;
    registry.find(group, AccountKind::Group)?;
    let mut row = registry.find(user, AccountKind::User)?.clone();
    row.group = group.to_string();
    registry.update(user, AccountKind::User, row)?;
    registry.save(&mut file, &mut sb)
}
