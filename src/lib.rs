//! Todos: a small REST service over a todo resource, with a grouped schema migration manager.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migrate;
pub mod migrations;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod store;

pub use app::{App, AppState, ExitSignal};
pub use config::Config;
pub use error::{classify, AppError, ConfigError, Error, HttpError};
pub use migrate::{Group, MigrateError, Migrator, Migrations};
pub use model::Todo;
pub use store::Db;
