//! Config validation.

use crate::config::Config;
use crate::error::ConfigError;

/// Environment names select a file, so they must be a bare file stem.
pub fn validate_env_name(env: &str) -> Result<(), ConfigError> {
    if env.trim().is_empty() {
        return Err(ConfigError::Validation("environment name is empty".into()));
    }
    if env.contains('/') || env.contains('\\') || env.contains("..") {
        return Err(ConfigError::Validation(format!(
            "invalid environment name: {}",
            env
        )));
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_env_name(&config.env)?;
    if config.db.dsn.trim().is_empty() {
        return Err(ConfigError::Validation("db.dsn is required".into()));
    }
    Ok(())
}
