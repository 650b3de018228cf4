//! Store handle: a pooled SQLite connection opened from the configured DSN.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use std::str::FromStr;

/// Cheap to clone; all clones share one pool.
#[derive(Clone, Debug)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open the store. With `verbose` off, per-statement logging is disabled.
    pub async fn connect(dsn: &str, verbose: bool) -> Result<Db, sqlx::Error> {
        let mut opts = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);
        if !verbose {
            opts = opts.disable_statement_logging();
        }

        let mut pool_opts = SqlitePoolOptions::new();
        if is_in_memory(dsn) {
            // Every in-memory connection is a separate database; keep exactly one alive.
            pool_opts = pool_opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_opts = pool_opts.max_connections(5);
        }

        let pool = pool_opts.connect_with(opts).await?;
        tracing::debug!(dsn = %dsn, verbose, "store connected");
        Ok(Db { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Db {
        Db { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial statement.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_in_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_is_shared_across_queries() {
        let db = Db::connect("sqlite::memory:", false).await.unwrap();
        sqlx::query("CREATE TABLE t (v INTEGER)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (v) VALUES (1)")
            .execute(db.pool())
            .await
            .unwrap();
        let clone = db.clone();
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t")
            .fetch_one(clone.pool())
            .await
            .unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn file_store_is_created_if_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.db");
        let dsn = format!("sqlite://{}", path.display());
        let db = Db::connect(&dsn, true).await.unwrap();
        db.close().await;
        assert!(path.exists());
    }
}

