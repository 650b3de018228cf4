//! Todo persistence against the `todos` table.

use crate::error::{AppError, HttpError};
use crate::model::Todo;
use crate::store::Db;

pub struct TodoService;

impl TodoService {
    /// All rows in the store's natural order.
    pub async fn list(db: &Db) -> Result<Vec<Todo>, AppError> {
        let rows = sqlx::query_as::<_, Todo>("SELECT id, title, description FROM todos")
            .fetch_all(db.pool())
            .await?;
        Ok(rows)
    }

    /// Fetch one row by id; [`AppError::NotFound`] when no row matches.
    pub async fn find(db: &Db, id: u64) -> Result<Todo, AppError> {
        let Ok(id) = i64::try_from(id) else {
            return Err(AppError::NotFound);
        };
        sqlx::query_as::<_, Todo>("SELECT id, title, description FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Insert a row. An id of 0 is assigned by the store; the stored row is returned.
    pub async fn create(db: &Db, todo: Todo) -> Result<Todo, AppError> {
        let requested = i64::try_from(todo.id)
            .map_err(|_| HttpError::bad_request(format!("id out of range: {}", todo.id)))?;
        tracing::debug!(id = requested, title = %todo.title, "insert todo");
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO todos (id, title, description) VALUES (NULLIF(?, 0), ?, ?) RETURNING id",
        )
        .bind(requested)
        .bind(&todo.title)
        .bind(&todo.description)
        .fetch_one(db.pool())
        .await?;
        let id = u64::try_from(id).map_err(|_| AppError::Internal(format!("store assigned invalid id {}", id)))?;
        Ok(Todo { id, ..todo })
    }
}
