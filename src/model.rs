//! Row types.

use serde::{Deserialize, Serialize};

/// One row of `todos`. Absent JSON fields decode to their zero values; an `id` of 0 means
/// "let the store assign one".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Todo {
    #[sqlx(try_from = "i64")]
    pub id: u64,
    pub title: String,
    pub description: String,
}
