//! Load config from `configs/<env>.yaml`.

use crate::config::{validate, validate_env_name, Config};
use crate::error::ConfigError;
use std::path::Path;

/// Directory searched for environment documents, relative to the working directory.
pub const CONFIG_DIR: &str = "configs";

impl Config {
    /// Load the profile for `env` from [`CONFIG_DIR`].
    pub fn load(service: &str, env: &str) -> Result<Config, ConfigError> {
        Self::load_from(Path::new(CONFIG_DIR), service, env)
    }

    pub fn load_from(dir: &Path, service: &str, env: &str) -> Result<Config, ConfigError> {
        validate_env_name(env)?;
        let path = dir.join(format!("{}.yaml", env));
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let mut cfg = Self::from_yaml(&raw)?;
        cfg.service = service.to_string();
        cfg.env = env.to_string();
        validate(&cfg)?;
        Ok(cfg)
    }

    /// Parse a document without service/env attribution.
    pub fn from_yaml(raw: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn write_profile(dir: &Path, env: &str, body: &str) {
        std::fs::write(dir.join(format!("{}.yaml", env)), body).unwrap();
    }

    #[test]
    fn loads_profile_and_fills_identity() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(
            dir.path(),
            "dev",
            "debug: true\ndb:\n  dsn: \"sqlite://todos.db?mode=rwc\"\n",
        );

        let cfg = Config::load_from(dir.path(), "api", "dev").unwrap();
        assert_eq!(cfg.service, "api");
        assert_eq!(cfg.env, "dev");
        assert!(cfg.debug);
        assert_eq!(cfg.db.dsn, "sqlite://todos.db?mode=rwc");
        assert_eq!(cfg.migrations.dir, Path::new("migrations"));
        assert_eq!(cfg.server.shutdown_grace(), Duration::from_secs(10));
    }

    #[test]
    fn optional_sections_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(
            dir.path(),
            "prod",
            "db:\n  dsn: \"sqlite::memory:\"\nmigrations:\n  dir: db/migrations\nserver:\n  shutdown_grace_secs: 3\n",
        );

        let cfg = Config::load_from(dir.path(), "db", "prod").unwrap();
        assert!(!cfg.debug);
        assert_eq!(cfg.migrations.dir, Path::new("db/migrations"));
        assert_eq!(cfg.server.shutdown_grace_secs, 3);
    }

    #[test]
    fn missing_profile_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path(), "api", "staging").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "dev", "db: [unterminated\n");
        let err = Config::load_from(dir.path(), "api", "dev").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_dsn_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "dev", "db:\n  dsn: \"\"\n");
        let err = Config::load_from(dir.path(), "api", "dev").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn env_names_cannot_escape_the_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path(), "api", "../secrets").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
