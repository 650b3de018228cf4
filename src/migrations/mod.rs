//! Migrations shipped with the service.
//!
//! Code migrations are registered here; SQL migrations are picked up from the configured
//! migrations directory at startup.

mod m20240315093000_create_todos;

use std::path::Path;

use crate::migrate::{discover_sql, MigrateError, Migrations};

/// Code migrations compiled into the binary.
pub fn builtin() -> Result<Migrations, MigrateError> {
    let mut registry = Migrations::new();
    registry.register("20240315093000_create_todos", m20240315093000_create_todos::CreateTodos)?;
    Ok(registry)
}

/// Code migrations plus the SQL migrations found in `dir`.
pub fn registry(dir: &Path) -> Result<Migrations, MigrateError> {
    let mut registry = builtin()?;
    registry.extend(discover_sql(dir)?)?;
    Ok(registry)
}
