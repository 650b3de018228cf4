//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::migrate::MigrateError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("config parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
}

/// A decided transport error: the status and message a caller receives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("code={}, message={}", .status.as_u16(), .message)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HttpError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

/// Failure kinds produced by handlers and the store layer. Status policy lives in [`classify`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body ended before any document was read.
    #[error("EOF")]
    Eof,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Structurally malformed request body.
    #[error("{0}")]
    Parse(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

/// Maps an application error onto the transport error the caller sees.
///
/// Decision order: EOF, not found, already classified, malformed body, everything else.
/// Classifying the result again yields the same value.
pub fn classify(err: &AppError) -> HttpError {
    match err {
        AppError::Eof => HttpError::new(StatusCode::BAD_REQUEST, "EOF"),
        AppError::NotFound => HttpError::new(StatusCode::NOT_FOUND, "not found"),
        AppError::Http(e) => e.clone(),
        AppError::Parse(msg) => HttpError::new(StatusCode::BAD_REQUEST, msg.clone()),
        AppError::Db(e) => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        AppError::Internal(msg) => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message.clone(),
        };
        let mut res = (self.status, Json(body)).into_response();
        // Picked up by the API error middleware for reporting.
        res.extensions_mut().insert(self);
        res
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        classify(&self).into_response()
    }
}

/// Errors surfaced by CLI commands; printed by the binary before a non-zero exit.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migrate: {0}")]
    Migrate(#[from] MigrateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("server: {0}")]
    Server(String),
}
