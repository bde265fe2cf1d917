//! The account registry: newline-delimited CSV rows stored in the file at
//! inode 1.
//!
//! Group rows are `id,G,name`; user rows are `id,U,group,user,password`.
//! Removal is a soft delete that sets the id to "0"; deleted rows stay in
//! the file and are skipped by every lookup.

use std::io::{Read, Seek, Write};

use crate::error::{FsError, Result};
use crate::fs::{dir_tree, Superblock, ACCOUNTS_INODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Group,
    User,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Group => "G",
            AccountKind::User => "U",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub id: String,
    pub kind: AccountKind,
    pub group: String,
    /// Empty for group rows.
    pub user: String,
    /// Empty for group rows.
    pub password: String,
}

impl AccountRow {
    pub fn group(id: i32, name: &str) -> Self {
        AccountRow {
            id: id.to_string(),
            kind: AccountKind::Group,
            group: name.to_string(),
            user: String::new(),
            password: String::new(),
        }
    }

    pub fn user(id: i32, group: &str, name: &str, password: &str) -> Self {
        AccountRow {
            id: id.to_string(),
            kind: AccountKind::User,
            group: group.to_string(),
            user: name.to_string(),
            password: password.to_string(),
        }
    }

    /// Parse one CSV line; malformed lines yield `None` and are dropped.
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match fields.as_slice() {
            [id, "G", name] => Some(AccountRow {
                id: id.to_string(),
                kind: AccountKind::Group,
                group: name.to_string(),
                user: String::new(),
                password: String::new(),
            }),
            [id, "U", group, user, password] => Some(AccountRow {
                id: id.to_string(),
                kind: AccountKind::User,
                group: group.to_string(),
                user: user.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        }
    }

    fn to_line(&self) -> String {
        match self.kind {
            AccountKind::Group => format!("{},G,{}", self.id, self.group),
            AccountKind::User => format!(
                "{},U,{},{},{}",
                self.id, self.group, self.user, self.password
            ),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.id == "0"
    }

    /// The name a lookup matches on: the group name for group rows, the
    /// user name for user rows.
    pub fn name(&self) -> &str {
        match self.kind {
            AccountKind::Group => &self.group,
            AccountKind::User => &self.user,
        }
    }
}

/// The parsed registry. Loaded whole, mutated in memory, saved whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    rows: Vec<AccountRow>,
}

impl Registry {
    pub fn load<F>(file: &mut F, sb: &Superblock) -> Result<Self>
    where
        F: Read + Seek,
    {
        let content = dir_tree::read_file_content(file, sb, ACCOUNTS_INODE)?;
        let text = String::from_utf8_lossy(&content);
        let rows = text.lines().filter_map(AccountRow::parse).collect();
        Ok(Registry { rows })
    }

    /// Rewrite the registry file, re-deriving the inode size and touching
    /// its times.
    pub fn save<F>(&self, file: &mut F, sb: &mut Superblock) -> Result<()>
    where
        F: Read + Write + Seek,
    {
        let mut text = String::new();
        for row in &self.rows {
            text.push_str(&row.to_line());
            text.push('\n');
        }
        dir_tree::write_file_content(file, sb, ACCOUNTS_INODE, text.as_bytes())
    }

    /// Find the non-deleted row of `kind` named `name`.
    pub fn find(&self, name: &str, kind: AccountKind) -> Result<&AccountRow> {
        self.rows
            .iter()
            .filter(|r| !r.is_deleted())
            .find(|r| r.kind == kind && r.name() == name)
            .ok_or_else(|| {
                FsError::NotFound(format!("{} {name:?}", match kind {
                    AccountKind::Group => "group",
                    AccountKind::User => "user",
                }))
            })
    }

    pub fn add(&mut self, row: AccountRow) -> Result<()> {
        if self.find(row.name(), row.kind).is_ok() {
            return Err(FsError::AlreadyExists(format!(
                "{} {:?}",
                match row.kind {
                    AccountKind::Group => "group",
                    AccountKind::User => "user",
                },
                row.name()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Replace the matching row in place.
    pub fn update(&mut self, name: &str, kind: AccountKind, new_row: AccountRow) -> Result<()> {
        let index = self
            .rows
            .iter()
            .position(|r| !r.is_deleted() && r.kind == kind && r.name() == name)
            .ok_or_else(|| FsError::NotFound(format!("account {name:?}")))?;
        self.rows[index] = new_row;
        Ok(())
    }

    /// Soft delete: the row keeps its line with id "0".
    pub fn remove(&mut self, name: &str, kind: AccountKind) -> Result<()> {
        let index = self
            .rows
            .iter()
            .position(|r| !r.is_deleted() && r.kind == kind && r.name() == name)
            .ok_or_else(|| FsError::NotFound(format!("account {name:?}")))?;
        self.rows[index].id = "0".to_string();
        Ok(())
    }

    /// Next id: 1 + the highest numeric id over all rows, deleted included.
    /// Non-numeric ids are ignored.
    pub fn next_id(&self) -> i32 {
        self.rows
            .iter()
            .filter_map(|r| r.id.parse::<i32>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn rows(&self) -> &[AccountRow] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::format::format;
    use crate::fs::INITIAL_ACCOUNTS;
    use std::io::Cursor;

    fn formatted() -> (Cursor<Vec<u8>>, Superblock) {
        let size = 128 * 1024;
        let mut image = Cursor::new(vec![0u8; size as usize]);
        let sb = format(&mut image, 0, size).unwrap();
        (image, sb)
    }

    #[test]
    fn initial_registry_holds_root() {
        let (mut image, sb) = formatted();
        let registry = Registry::load(&mut image, &sb).unwrap();
        assert_eq!(registry.rows().len(), 2);
        assert_eq!(
            registry.find("root", AccountKind::Group).unwrap().id,
            "1"
        );
        let root = registry.find("root", AccountKind::User).unwrap();
        assert_eq!(root.group, "root");
        assert_eq!(root.password, "123");
        assert_eq!(registry.next_id(), 2);
    }

    #[test]
    fn add_find_remove_flow() {
        let (mut image, mut sb) = formatted();
        let mut registry = Registry::load(&mut image, &sb).unwrap();

        let id = registry.next_id();
        registry.add(AccountRow::group(id, "admins")).unwrap();
        let id = registry.next_id();
        registry
            .add(AccountRow::user(id, "admins", "alice", "pw"))
            .unwrap();
        registry.save(&mut image, &mut sb).unwrap();

        let reloaded = Registry::load(&mut image, &sb).unwrap();
        let alice = reloaded.find("alice", AccountKind::User).unwrap();
        assert_eq!(alice.group, "admins");

        let mut reloaded = reloaded;
        reloaded.remove("alice", AccountKind::User).unwrap();
        reloaded.save(&mut image, &mut sb).unwrap();

        let after = Registry::load(&mut image, &sb).unwrap();
        assert!(matches!(
            after.find("alice", AccountKind::User),
            Err(FsError::NotFound(_))
        ));
        // the line is retained, soft-deleted
        assert_eq!(after.rows().len(), 4);
        assert!(after.rows()[3].is_deleted());
    }

    #[test]
    fn duplicates_and_deleted_ids_interact() {
        let (mut image, sb) = formatted();
        let mut registry = Registry::load(&mut image, &sb).unwrap();

        registry.add(AccountRow::group(2, "staff")).unwrap();
        assert!(matches!(
            registry.add(AccountRow::group(3, "staff")),
            Err(FsError::AlreadyExists(_))
        ));

        registry.remove("staff", AccountKind::Group).unwrap();
        // a deleted row no longer blocks re-creation, and its former id
        // no longer feeds next_id
        registry.add(AccountRow::group(registry.next_id(), "staff")).unwrap();
        assert_eq!(registry.find("staff", AccountKind::Group).unwrap().id, "2");
    }

    #[test]
    fn update_rewrites_a_row_in_place() {
        let (mut image, sb) = formatted();
        let mut registry = Registry::load(&mut image, &sb).unwrap();
        registry.add(AccountRow::group(2, "devs")).unwrap();
        registry
            .add(AccountRow::user(3, "root", "bob", "pw"))
            .unwrap();

        let mut row = registry.find("bob", AccountKind::User).unwrap().clone();
        row.group = "devs".to_string();
        registry.update("bob", AccountKind::User, row).unwrap();
        assert_eq!(registry.find("bob", AccountKind::User).unwrap().group, "devs");
    }

    #[test]
    fn malformed_lines_are_dropped() {
        assert_eq!(AccountRow::parse(""), None);
        assert_eq!(AccountRow::parse("1,X,foo"), None);
        assert_eq!(AccountRow::parse("1,U,too,few"), None);
        let row = AccountRow::parse("1,U,root,root,123").unwrap();
        assert_eq!(row.to_line(), "1,U,root,root,123");
        assert!(INITIAL_ACCOUNTS.lines().all(|l| AccountRow::parse(l).is_some()));
    }
}
