#![allow(dead_code)]

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use todos::migrate::Migrator;
use todos::{migrations, App, Config, Db};

pub fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

pub fn test_config() -> Config {
    let raw = format!(
        "db:\n  dsn: \"sqlite::memory:\"\nmigrations:\n  dir: \"{}\"\n",
        migrations_dir().display()
    );
    Config::from_yaml(&raw).unwrap()
}

pub async fn memory_db() -> Db {
    Db::connect("sqlite::memory:", false).await.unwrap()
}

/// An application over a fresh in-memory store. With `migrated`, the todos schema is in place.
pub async fn app(migrated: bool) -> App {
    let cfg = test_config();
    let db = memory_db().await;
    if migrated {
        let m = Migrator::new(db.clone(), migrations::registry(&cfg.migrations.dir).unwrap());
        m.init().await.unwrap();
        m.migrate().await.unwrap();
    }
    App::new(&CancellationToken::new(), cfg, db)
}

pub async fn table_exists(db: &Db, name: &str) -> bool {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_optional(db.pool())
            .await
            .unwrap();
    row.is_some()
}
