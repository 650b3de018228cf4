mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use todos::routes;

async fn router() -> Router {
    let mut app = common::app(true).await;
    routes::init_routes(&mut app);
    app.router()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    if body.is_some() {
        req = req.header("content-type", "application/json");
    }
    let req = req
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json_of(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let r = router().await;
    let (status, body) = send(&r, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!([]));
}

#[tokio::test]
async fn create_then_show_and_list() {
    let r = router().await;

    let (status, body) = send(
        &r,
        Method::POST,
        "/api/todos",
        Some(r#"{"title":"buy milk","description":""}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json!({"id": 1, "title": "buy milk", "description": ""});
    assert_eq!(json_of(&body), created);

    let (status, body) = send(&r, Method::GET, "/api/todo/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), created);

    let (status, body) = send(&r, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!([created]));

    let (status, body) = send(&r, Method::GET, "/api/todo/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_of(&body), json!({"message": "not found"}));
}

#[tokio::test]
async fn unparsable_id_is_not_found() {
    let r = router().await;
    let (status, _) = send(&r, Method::GET, "/api/todo/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_body_is_eof() {
    let r = router().await;
    let (status, body) = send(&r, Method::POST, "/api/todos", Some("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body), json!({"message": "EOF"}));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let r = router().await;
    let (status, body) = send(&r, Method::POST, "/api/todos", Some(r#"{"title": "#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json_of(&body)["message"].as_str().unwrap().to_string();
    assert!(!message.is_empty());

    let (_, body) = send(&r, Method::GET, "/api/todos", None).await;
    assert_eq!(json_of(&body), json!([]));
}

#[tokio::test]
async fn array_body_is_rejected() {
    let r = router().await;
    let (status, body) = send(&r, Method::POST, "/api/todos", Some(r#"[7,"x","y"]"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_of(&body)["message"].as_str().unwrap().contains("array"));

    let (_, body) = send(&r, Method::GET, "/api/todo/7", None).await;
    assert_eq!(json_of(&body), json!({"message": "not found"}));
}

#[tokio::test]
async fn create_keeps_fields_unvalidated() {
    let r = router().await;
    let (status, body) = send(&r, Method::POST, "/api/todos", Some("{}")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_of(&body), json!({"id": 1, "title": "", "description": ""}));
}

#[tokio::test]
async fn update_and_delete_are_accepted_without_mutation() {
    let r = router().await;
    send(
        &r,
        Method::POST,
        "/api/todos",
        Some(r#"{"title":"buy milk","description":""}"#),
    )
    .await;

    let (status, body) = send(&r, Method::PUT, "/api/todo/1", Some(r#"{"title":"x"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, body) = send(&r, Method::DELETE, "/api/todo/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (_, body) = send(&r, Method::GET, "/api/todo/1", None).await;
    assert_eq!(json_of(&body)["title"], "buy milk");
}

#[tokio::test]
async fn store_failures_are_internal_errors() {
    // No migrations: the todos table does not exist.
    let mut app = common::app(false).await;
    routes::init_routes(&mut app);
    let r = app.router();

    let (status, body) = send(&r, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json_of(&body)["message"].as_str().unwrap().to_string();
    assert!(message.contains("no such table"));
}

#[tokio::test]
async fn routes_live_under_api_prefix() {
    let r = router().await;
    let (status, _) = send(&r, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn probes_report_store_state() {
    let mut app = common::app(true).await;
    routes::init_routes(&mut app);
    let r = app.router();

    let (status, body) = send(&r, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({"status": "ok"}));

    let (status, body) = send(&r, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({"status": "ok", "store": "ok"}));

    let (_, body) = send(&r, Method::GET, "/version", None).await;
    assert_eq!(json_of(&body)["name"], "todos");

    app.db().close().await;
    let (status, body) = send(&r, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_of(&body)["status"], "degraded");
}
