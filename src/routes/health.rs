//! Probe routes at the root: liveness, readiness against the store, build version.

use axum::{extract::State, http::StatusCode, routing::get, Json};
use serde::Serialize;

use crate::app::{App, AppState};

#[derive(Serialize)]
struct Probe {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<&'static str>,
}

async fn live() -> Json<Probe> {
    Json(Probe {
        status: "ok",
        store: None,
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Probe>) {
    match state.db().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Probe {
                status: "ok",
                store: Some("ok"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Probe {
                    status: "degraded",
                    store: Some("unavailable"),
                }),
            )
        }
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready, GET /version.
pub fn init_routes(app: &mut App) {
    app.with_routes(|r| {
        r.route("/health", get(live))
            .route("/ready", get(ready))
            .route("/version", get(version))
    });
}
