//! Configuration document shape (`configs/<env>.yaml`).

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Name of the invoked command; set by the loader.
    #[serde(skip)]
    pub service: String,
    /// Environment profile the document was loaded for; set by the loader.
    #[serde(skip)]
    pub env: String,
    #[serde(default)]
    pub debug: bool,
    pub db: DbConfig,
    #[serde(default)]
    pub migrations: MigrationsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DbConfig {
    pub dsn: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MigrationsConfig {
    /// Holds SQL migrations and generated migration templates.
    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        MigrationsConfig {
            dir: default_migrations_dir(),
        }
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_shutdown_grace_secs() -> u64 {
    10
}
