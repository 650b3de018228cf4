//! Grouped schema migrations tracked in the store itself.
//!
//! Applied migrations are rows of the migrations table, each tagged with the group (run) that
//! applied it. A separate locks table holds at most one row per migrations table; inserting it
//! is the mutual exclusion for `migrate`, `rollback` and `mark_applied`.

pub mod files;
pub mod migration;

pub use files::{create_rs, create_sql, discover_sql, MigrationFile};
pub use migration::{Group, Migration, MigrationSlice, MigrationStatus, MigrationStep, Migrations, SqlStep};

use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::HashMap;
use thiserror::Error;

use crate::store::Db;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("migrations table is already locked")]
    Locked,
    #[error("invalid migration name: {0}")]
    InvalidName(String),
    #[error("duplicate migration: {0}")]
    Duplicate(String),
    #[error("down migration without up migration: {0}")]
    MissingUp(String),
    #[error("migration {name} failed: {source}")]
    Step {
        name: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub const DEFAULT_TABLE: &str = "schema_migrations";
pub const DEFAULT_LOCKS_TABLE: &str = "schema_migration_locks";

/// Runs registered migrations against a store. One runner per schema at a time.
pub struct Migrator {
    db: Db,
    migrations: Migrations,
    table: String,
    locks_table: String,
}

#[derive(Clone, Copy)]
enum Mode {
    Run,
    /// Record as applied without executing the step.
    Nop,
}

impl Migrator {
    pub fn new(db: Db, migrations: Migrations) -> Self {
        Migrator {
            db,
            migrations,
            table: DEFAULT_TABLE.to_string(),
            locks_table: DEFAULT_LOCKS_TABLE.to_string(),
        }
    }

    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_locks_table_name(mut self, table: impl Into<String>) -> Self {
        self.locks_table = table.into();
        self
    }

    pub fn migrations(&self) -> &Migrations {
        &self.migrations
    }

    /// Create the bookkeeping tables. Safe to repeat.
    pub async fn init(&self) -> Result<(), MigrateError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                group_id INTEGER NOT NULL,
                migrated_at TEXT NOT NULL
            )
            "#,
            quote(&self.table)
        );
        sqlx::query(&ddl).execute(self.db.pool()).await?;

        let locks_ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name TEXT NOT NULL UNIQUE
            )
            "#,
            quote(&self.locks_table)
        );
        sqlx::query(&locks_ddl).execute(self.db.pool()).await?;
        tracing::info!(table = %self.table, locks_table = %self.locks_table, "migration tables ready");
        Ok(())
    }

    /// Acquire the migration lock; fails with [`MigrateError::Locked`] if it is held.
    pub async fn lock(&self) -> Result<(), MigrateError> {
        let sql = format!(
            "INSERT INTO {} (table_name) VALUES (?) ON CONFLICT (table_name) DO NOTHING",
            quote(&self.locks_table)
        );
        let result = sqlx::query(&sql)
            .bind(&self.table)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(MigrateError::Locked);
        }
        Ok(())
    }

    /// Release the lock whether or not it is held.
    pub async fn unlock(&self) -> Result<(), MigrateError> {
        let sql = format!("DELETE FROM {} WHERE table_name = ?", quote(&self.locks_table));
        sqlx::query(&sql)
            .bind(&self.table)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Every registered migration with its applied state, in ascending order.
    pub async fn migrations_with_status(&self) -> Result<MigrationSlice, MigrateError> {
        let applied = self.applied_rows().await?;
        let out = self
            .migrations
            .iter()
            .map(|m| {
                let row = applied.get(&m.identity());
                MigrationStatus {
                    name: m.name.clone(),
                    comment: m.comment.clone(),
                    group_id: row.map(|r| r.0).unwrap_or(0),
                    migrated_at: row.map(|r| r.1),
                }
            })
            .collect();
        Ok(MigrationSlice(out))
    }

    /// Apply every unapplied migration as one new group. Returns the zero group if none are pending.
    pub async fn migrate(&self) -> Result<Group, MigrateError> {
        self.locked(self.apply(Mode::Run)).await
    }

    /// Record every unapplied migration as applied without running it.
    pub async fn mark_applied(&self) -> Result<Group, MigrateError> {
        self.locked(self.apply(Mode::Nop)).await
    }

    /// Undo the most recent group in reverse order. Returns the zero group if nothing is applied.
    pub async fn rollback(&self) -> Result<Group, MigrateError> {
        self.locked(self.revert()).await
    }

    async fn locked<F>(&self, run: F) -> Result<Group, MigrateError>
    where
        F: std::future::Future<Output = Result<Group, MigrateError>>,
    {
        self.lock().await?;
        let outcome = run.await;
        let released = self.unlock().await;
        let group = outcome?;
        released?;
        Ok(group)
    }

    async fn apply(&self, mode: Mode) -> Result<Group, MigrateError> {
        let status = self.migrations_with_status().await?;
        let pending = status.unapplied();
        if pending.is_empty() {
            return Ok(Group::default());
        }

        let mut group = Group {
            id: self.max_group_id().await? + 1,
            migrations: MigrationSlice::default(),
        };

        let insert = format!(
            "INSERT INTO {} (name, group_id, migrated_at) VALUES (?, ?, ?)",
            quote(&self.table)
        );
        for entry in pending.0 {
            let identity = entry.identity();
            let Some(migration) = self.migrations.get(&identity) else {
                continue;
            };
            let migrated_at = Utc::now();
            let mut tx = self.db.pool().begin().await?;
            if let Mode::Run = mode {
                tracing::info!(migration = %identity, group = group.id, "applying migration");
                migration
                    .step()
                    .up(&mut *tx)
                    .await
                    .map_err(|source| MigrateError::Step {
                        name: identity.clone(),
                        source,
                    })?;
            }
            sqlx::query(&insert)
                .bind(&identity)
                .bind(group.id)
                .bind(migrated_at)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            group.migrations.0.push(MigrationStatus {
                group_id: group.id,
                migrated_at: Some(migrated_at),
                ..entry
            });
        }
        Ok(group)
    }

    async fn revert(&self) -> Result<Group, MigrateError> {
        let status = self.migrations_with_status().await?;
        let group = status.last_group();
        if group.is_zero() {
            return Ok(group);
        }

        let delete = format!("DELETE FROM {} WHERE name = ?", quote(&self.table));
        for entry in group.migrations.0.iter().rev() {
            let identity = entry.identity();
            let mut tx = self.db.pool().begin().await?;
            if let Some(migration) = self.migrations.get(&identity) {
                tracing::info!(migration = %identity, group = group.id, "rolling back migration");
                migration
                    .step()
                    .down(&mut *tx)
                    .await
                    .map_err(|source| MigrateError::Step {
                        name: identity.clone(),
                        source,
                    })?;
            }
            sqlx::query(&delete).bind(&identity).execute(&mut *tx).await?;
            tx.commit().await?;
        }
        Ok(group)
    }

    /// Highest recorded group, registered or not, so a new group never reuses an id.
    async fn max_group_id(&self) -> Result<i64, MigrateError> {
        let sql = format!("SELECT COALESCE(MAX(group_id), 0) FROM {}", quote(&self.table));
        let (id,): (i64,) = sqlx::query_as(&sql).fetch_one(self.db.pool()).await?;
        Ok(id)
    }

    async fn applied_rows(&self) -> Result<HashMap<String, (i64, DateTime<Utc>)>, MigrateError> {
        let sql = format!(
            "SELECT name, group_id, migrated_at FROM {} ORDER BY id",
            quote(&self.table)
        );
        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let group_id: i64 = row.try_get("group_id")?;
            let migrated_at: DateTime<Utc> = row.try_get("migrated_at")?;
            out.insert(name, (group_id, migrated_at));
        }
        Ok(out)
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
