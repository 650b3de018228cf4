//! On-disk migrations: discovery of `.up.sql`/`.down.sql` pairs and template generation.

use chrono::Utc;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::migration::{parse_identity, Migration, Migrations, SqlStep};
use super::MigrateError;

const SQL_FILE_PATTERN: &str = r"^(\d{1,14}_[0-9a-z_\-]+)\.(up|down)\.sql$";

/// A file written by `create_sql` / `create_rs`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationFile {
    pub name: String,
    pub path: PathBuf,
}

/// Load SQL migrations from `dir`. A missing directory yields an empty registry.
pub fn discover_sql(dir: &Path) -> Result<Migrations, MigrateError> {
    let mut out = Migrations::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(SQL_FILE_PATTERN))
        .as_ref()
        .map_err(|e| MigrateError::InvalidName(e.to_string()))?;

    let mut ups: BTreeMap<String, String> = BTreeMap::new();
    let mut downs: BTreeMap<String, String> = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(caps) = re.captures(file_name) else {
            continue;
        };
        let contents = fs::read_to_string(entry.path())?;
        match &caps[2] {
            "up" => ups.insert(caps[1].to_string(), contents),
            _ => downs.insert(caps[1].to_string(), contents),
        };
    }

    if let Some(orphan) = downs.keys().find(|k| !ups.contains_key(*k)) {
        return Err(MigrateError::MissingUp(orphan.clone()));
    }

    for (identity, up) in ups {
        let down = downs.remove(&identity);
        out.add(Migration::new(&identity, SqlStep { up, down })?)?;
    }
    tracing::debug!(dir = %dir.display(), count = out.len(), "discovered sql migrations");
    Ok(out)
}

/// Join CLI words into a migration comment: `add due date` → `add_due_date`.
pub fn migration_comment(words: &[String]) -> Result<String, MigrateError> {
    let comment = words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if comment.is_empty() {
        return Err(MigrateError::InvalidName("migration name is empty".into()));
    }
    Ok(comment)
}

fn new_identity(words: &[String]) -> Result<String, MigrateError> {
    let comment = migration_comment(words)?;
    let identity = format!("{}_{}", Utc::now().format("%Y%m%d%H%M%S"), comment);
    parse_identity(&identity)?;
    Ok(identity)
}

fn write_new(dir: &Path, file_name: &str, contents: &str) -> Result<MigrationFile, MigrateError> {
    let path = dir.join(file_name);
    if path.exists() {
        return Err(MigrateError::Duplicate(file_name.to_string()));
    }
    fs::write(&path, contents)?;
    Ok(MigrationFile {
        name: file_name.to_string(),
        path,
    })
}

/// Write empty up/down SQL templates.
pub fn create_sql(dir: &Path, words: &[String]) -> Result<Vec<MigrationFile>, MigrateError> {
    let identity = new_identity(words)?;
    fs::create_dir_all(dir)?;
    let up = write_new(
        dir,
        &format!("{}.up.sql", identity),
        "-- forward statements for this migration\n",
    )?;
    let down = write_new(
        dir,
        &format!("{}.down.sql", identity),
        "-- statements undoing the matching .up.sql\n",
    )?;
    Ok(vec![up, down])
}

/// Write a Rust source template implementing `MigrationStep`.
pub fn create_rs(dir: &Path, words: &[String]) -> Result<MigrationFile, MigrateError> {
    let identity = new_identity(words)?;
    fs::create_dir_all(dir)?;
    write_new(dir, &format!("m{}.rs", identity), &rs_template(&identity))
}

fn rs_template(identity: &str) -> String {
    let type_name: String = identity
        .split(['_', '-'])
        .filter(|p| !p.is_empty() && !p.chars().all(|c| c.is_ascii_digit()))
        .map(|p| {
            let mut chars = p.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    format!(
        r#"//! {identity}

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::MigrationStep;

/// Register with `registry.register("{identity}", {type_name})`.
pub struct {type_name};

#[async_trait]
impl MigrationStep for {type_name} {{
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {{
        let _ = conn;
        Ok(())
    }}

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {{
        let _ = conn;
        Ok(())
    }}
}}
"#
    )
}
