//! Todo routes on the API sub-router (mounted under `/api`).

use crate::app::App;
use crate::handlers::todo::{create, delete, list, show, update};
use axum::routing::get;

pub fn init_routes(app: &mut App) {
    app.with_api_routes(|api| {
        api.route("/todos", get(list).post(create))
            .route("/todo/:id", get(show).put(update).delete(delete))
    });
}
