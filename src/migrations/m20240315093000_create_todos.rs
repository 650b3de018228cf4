//! 20240315093000_create_todos

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::MigrationStep;

pub struct CreateTodos;

#[async_trait]
impl MigrationStep for CreateTodos {
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("DROP TABLE todos").execute(&mut *conn).await?;
        Ok(())
    }
}
