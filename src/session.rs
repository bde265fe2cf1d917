//! The per-process command context: mount table plus the active session.
//! Commands receive it explicitly; there is no process-wide global state.

use crate::disk::MountTable;
use crate::error::{FsError, Result};

pub const ROOT_USER: &str = "root";

/// An authenticated user on one mounted partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub group: String,
    pub mount_id: String,
}

impl Session {
    pub fn is_root(&self) -> bool {
        self.user == ROOT_USER
    }
}

/// State shared by every command in a run. Lives in memory only; nothing
/// survives a restart and no partition is re-mounted automatically.
#[derive(Debug, Default)]
pub struct Context {
    pub mounts: MountTable,
    pub session: Option<Session>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| FsError::PermissionDenied("no active session".into()))
    }

    /// The active session, which must belong to the root user.
    pub fn require_root(&self) -> Result<&Session> {
        let session = self.active_session()?;
        if !session.is_root() {
            return Err(FsError::PermissionDenied(format!(
                "user {:?} is not root",
                session.user
            )));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_gates() {
        let mut ctx = Context::new();
        assert!(matches!(
            ctx.active_session(),
            Err(FsError::PermissionDenied(_))
        ));

        ctx.session = Some(Session {
            user: "alice".into(),
            group: "users".into(),
            mount_id: "461A".into(),
        });
        assert!(ctx.active_session().is_ok());
        assert!(matches!(
            ctx.require_root(),
            Err(FsError::PermissionDenied(_))
        ));

        ctx.session.as_mut().unwrap().user = ROOT_USER.into();
        assert!(ctx.require_root().is_ok());
    }
}
