//! Command-line surface: `api` serves HTTP, `db` manages schema migrations.

pub mod api;
pub mod db;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::config::Config;
use crate::error::Error;
use crate::store::Db;

#[derive(Parser, Debug)]
#[command(name = "todos")]
#[command(author, version, about = "Todo service and schema migration manager", long_about = None)]
pub struct Cli {
    /// Configuration profile, read from configs/<env>.yaml
    #[arg(long, global = true, default_value = "dev")]
    pub env: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Api {
        /// Listen address; a bare `:port` binds all interfaces
        #[arg(long, default_value = ":8000")]
        addr: String,
    },
    /// Manage database migrations
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

impl Command {
    /// Service name recorded in the loaded configuration.
    pub fn service(&self) -> &'static str {
        match self {
            Command::Api { .. } => "api",
            Command::Db { .. } => "db",
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DbCommand {
    /// Create migration tables
    Init,
    /// Migrate database
    Migrate,
    /// Rollback the last migration group
    Rollback,
    /// Lock migrations
    Lock,
    /// Unlock migrations
    Unlock,
    /// Create a Rust migration template
    #[command(name = "create_rs", alias = "create_go")]
    CreateRs {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Create up and down SQL migrations
    #[command(name = "create_sql")]
    CreateSql {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Print migrations status
    Status,
    /// Mark migrations as applied without actually running them
    #[command(name = "mark_applied")]
    MarkApplied,
}

/// Connect the store, build the application and dispatch the command.
pub async fn run(cli: Cli, cfg: Config) -> Result<(), Error> {
    let store = Db::connect(&cfg.db.dsn, cfg.debug).await?;
    let root = CancellationToken::new();
    let app = App::new(&root, cfg, store);

    match cli.command {
        Command::Api { addr } => api::serve(app, &addr).await,
        Command::Db { command } => {
            let lines = db::run(&app, command).await;
            app.db().close().await;
            for line in lines? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_defaults_to_dev() {
        let cli = Cli::try_parse_from(["todos", "db", "status"]).unwrap();
        assert_eq!(cli.env, "dev");
        assert_eq!(cli.command.service(), "db");
    }

    #[test]
    fn env_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["todos", "api", "--env", "test"]).unwrap();
        assert_eq!(cli.env, "test");
        match cli.command {
            Command::Api { addr } => assert_eq!(addr, ":8000"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn snake_case_db_commands_parse() {
        let cli = Cli::try_parse_from(["todos", "db", "mark_applied"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Db {
                command: DbCommand::MarkApplied
            }
        ));

        let cli = Cli::try_parse_from(["todos", "db", "create_go", "add", "due", "date"]).unwrap();
        match cli.command {
            Command::Db {
                command: DbCommand::CreateRs { name },
            } => assert_eq!(name, vec!["add", "due", "date"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn create_requires_a_name() {
        assert!(Cli::try_parse_from(["todos", "db", "create_sql"]).is_err());
    }
}
