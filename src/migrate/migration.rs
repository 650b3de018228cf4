//! Migration units, the registry that orders them, and the status views built over them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::{Executor, SqliteConnection};
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::MigrateError;

/// A schema change. `up` runs on `migrate`; `down` on `rollback`.
///
/// Both receive the connection of the transaction that also records the bookkeeping row.
#[async_trait]
pub trait MigrationStep: Send + Sync {
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    async fn down(&self, _conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// Forward/backward statement batches.
#[derive(Clone, Debug)]
pub struct SqlStep {
    pub up: String,
    pub down: Option<String>,
}

#[async_trait]
impl MigrationStep for SqlStep {
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        Executor::execute(&mut *conn, sqlx::raw_sql(&self.up)).await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        if let Some(ref down) = self.down {
            Executor::execute(&mut *conn, sqlx::raw_sql(down)).await?;
        }
        Ok(())
    }
}

/// Pattern for `<timestamp>_<comment>` migration identities.
pub const IDENTITY_PATTERN: &str = r"^(\d{1,14})_([0-9a-z_\-]+)$";

/// Split `<timestamp>_<comment>` into its parts.
pub fn parse_identity(identity: &str) -> Result<(String, String), MigrateError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(IDENTITY_PATTERN))
        .as_ref()
        .map_err(|e| MigrateError::InvalidName(e.to_string()))?;
    let caps = re
        .captures(identity)
        .ok_or_else(|| MigrateError::InvalidName(identity.to_string()))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

#[derive(Clone)]
pub struct Migration {
    pub name: String,
    pub comment: String,
    step: Arc<dyn MigrationStep>,
}

impl Migration {
    pub fn new(identity: &str, step: impl MigrationStep + 'static) -> Result<Migration, MigrateError> {
        let (name, comment) = parse_identity(identity)?;
        Ok(Migration {
            name,
            comment,
            step: Arc::new(step),
        })
    }

    pub fn step(&self) -> &dyn MigrationStep {
        self.step.as_ref()
    }

    /// `name_comment`, the value stored in the bookkeeping table.
    pub fn identity(&self) -> String {
        format!("{}_{}", self.name, self.comment)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("comment", &self.comment)
            .finish()
    }
}

/// Registered migrations in ascending identity order.
#[derive(Clone, Debug, Default)]
pub struct Migrations {
    list: Vec<Migration>,
}

impl Migrations {
    pub fn new() -> Self {
        Migrations { list: Vec::new() }
    }

    pub fn register(&mut self, identity: &str, step: impl MigrationStep + 'static) -> Result<(), MigrateError> {
        self.add(Migration::new(identity, step)?)
    }

    pub fn add(&mut self, migration: Migration) -> Result<(), MigrateError> {
        let identity = migration.identity();
        if self.list.iter().any(|m| m.identity() == identity) {
            return Err(MigrateError::Duplicate(identity));
        }
        let pos = self
            .list
            .partition_point(|m| (m.name.as_str(), m.comment.as_str()) < (migration.name.as_str(), migration.comment.as_str()));
        self.list.insert(pos, migration);
        Ok(())
    }

    pub fn extend(&mut self, other: Migrations) -> Result<(), MigrateError> {
        for m in other.list {
            self.add(m)?;
        }
        Ok(())
    }

    pub fn get(&self, identity: &str) -> Option<&Migration> {
        self.list.iter().find(|m| m.identity() == identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// A registered migration joined with its bookkeeping row, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    pub comment: String,
    /// 0 while unapplied.
    pub group_id: i64,
    pub migrated_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn identity(&self) -> String {
        format!("{}_{}", self.name, self.comment)
    }

    pub fn is_applied(&self) -> bool {
        self.group_id != 0
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationSlice(pub Vec<MigrationStatus>);

impl MigrationSlice {
    pub fn unapplied(&self) -> MigrationSlice {
        MigrationSlice(self.0.iter().filter(|m| !m.is_applied()).cloned().collect())
    }

    pub fn applied(&self) -> MigrationSlice {
        MigrationSlice(self.0.iter().filter(|m| m.is_applied()).cloned().collect())
    }

    /// Members of the highest recorded group; the zero group when nothing is applied.
    pub fn last_group(&self) -> Group {
        let id = self.last_group_id();
        if id == 0 {
            return Group::default();
        }
        Group {
            id,
            migrations: MigrationSlice(self.0.iter().filter(|m| m.group_id == id).cloned().collect()),
        }
    }

    pub fn last_group_id(&self) -> i64 {
        self.0.iter().map(|m| m.group_id).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MigrationSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("empty");
        }
        let names: Vec<String> = self.0.iter().map(MigrationStatus::identity).collect();
        f.write_str(&names.join(", "))
    }
}

/// Migrations applied together in one run. Id 0 means "no group".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub migrations: MigrationSlice,
}

impl Group {
    pub fn is_zero(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("nil");
        }
        write!(f, "group #{} ({})", self.id, self.migrations)
    }
}
