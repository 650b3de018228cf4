//! JSON request body extractor whose failures are application errors rather than axum rejections.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::Value;

use crate::error::{AppError, HttpError};

/// Decodes the request body as JSON.
///
/// An empty body is [`AppError::Eof`]; a syntactically broken or truncated document is
/// [`AppError::Parse`]; well-formed JSON of the wrong shape is an already-classified 400.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rej| HttpError::new(rej.status(), rej.body_text()))?;
        decode(&bytes).map(JsonBody)
    }
}

/// Decode a JSON object into `T`. Any other top-level value is a type error.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::Eof);
    }
    let value: Value = serde_json::from_slice(bytes).map_err(classify_json)?;
    if !value.is_object() {
        return Err(HttpError::bad_request(format!(
            "unmarshal type error: expected object, got {}",
            kind(&value)
        ))
        .into());
    }
    serde_json::from_value(value).map_err(classify_json)
}

fn classify_json(e: serde_json::Error) -> AppError {
    match e.classify() {
        Category::Syntax | Category::Eof => AppError::Parse(e.to_string()),
        Category::Data => HttpError::bad_request(format!("unmarshal type error: {}", e)).into(),
        Category::Io => AppError::Internal(e.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
