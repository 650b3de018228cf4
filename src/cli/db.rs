//! `db` subcommands. Each returns the lines to print on standard output.

use std::path::Path;

use crate::app::App;
use crate::cli::DbCommand;
use crate::error::Error;
use crate::migrate::{create_rs, create_sql, MigrationFile, Migrator};
use crate::migrations;

pub async fn run(app: &App, command: DbCommand) -> Result<Vec<String>, Error> {
    let dir = app.config().migrations.dir.as_path();

    let lines = match command {
        DbCommand::Init => {
            migrator(app, dir)?.init().await?;
            Vec::new()
        }
        DbCommand::Migrate => {
            let group = migrator(app, dir)?.migrate().await?;
            if group.is_zero() {
                vec!["there are no new migrations to run".to_string()]
            } else {
                vec![format!("migrated to {}", group)]
            }
        }
        DbCommand::Rollback => {
            let group = migrator(app, dir)?.rollback().await?;
            if group.is_zero() {
                vec!["there are no groups to roll back".to_string()]
            } else {
                vec![format!("rolled back {}", group)]
            }
        }
        DbCommand::Lock => {
            migrator(app, dir)?.lock().await?;
            Vec::new()
        }
        DbCommand::Unlock => {
            migrator(app, dir)?.unlock().await?;
            Vec::new()
        }
        DbCommand::CreateRs { name } => vec![created(&create_rs(dir, &name)?)],
        DbCommand::CreateSql { name } => create_sql(dir, &name)?.iter().map(created).collect(),
        DbCommand::Status => {
            let ms = migrator(app, dir)?.migrations_with_status().await?;
            vec![
                format!("migrations: {}", ms),
                format!("unapplied migrations: {}", ms.unapplied()),
                format!("last migration group: {}", ms.last_group()),
            ]
        }
        DbCommand::MarkApplied => {
            let group = migrator(app, dir)?.mark_applied().await?;
            if group.is_zero() {
                vec!["there are no new migrations to mark as applied".to_string()]
            } else {
                vec![format!("marked as applied {}", group)]
            }
        }
    };
    Ok(lines)
}

/// Template generation does not load the registry; everything else does.
fn migrator(app: &App, dir: &Path) -> Result<Migrator, Error> {
    Ok(Migrator::new(app.db().clone(), migrations::registry(dir)?))
}

fn created(file: &MigrationFile) -> String {
    format!("created migration {} ({})", file.name, file.path.display())
}
