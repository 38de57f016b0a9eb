//! Integration tests for the `nosqldb` REST API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use nosqldb_core::Database;
use nosqldb_server::{
    create_collection, delete_objects, health_check, list_collections, query_objects,
    update_object, write_object, AppState,
};

fn create_test_app(temp_dir: &TempDir) -> Router {
    let db = Database::open(temp_dir.path()).expect("failed to open database");
    let state = Arc::new(AppState { db });

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/collections",
            get(list_collections).post(create_collection),
        )
        .route("/collections/{name}/objects", post(write_object))
        .route("/collections/{name}/query", post(query_objects))
        .route("/collections/{name}/objects/{id}", patch(update_object))
        .route("/collections/{name}/delete", post(delete_objects))
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&body).expect("response body was not JSON")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

#[tokio::test]
async fn health_check_reports_ok() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn create_then_list_collections() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/collections", json!({"name": "people"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::builder().uri("/collections").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["collections"], json!(["people"]));
}

#[tokio::test]
async fn duplicate_collection_is_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    app.clone()
        .oneshot(json_request("POST", "/collections", json!({"name": "people"})))
        .await
        .unwrap();
    let response = app
        .oneshot(json_request("POST", "/collections", json!({"name": "people"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn write_then_query_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    app.clone()
        .oneshot(json_request("POST", "/collections", json!({"name": "people"})))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/collections/people/objects",
            json!({"id": "a", "kind": "cat", "name": "Tom"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], "a");

    let response = app
        .oneshot(json_request(
            "POST",
            "/collections/people/query",
            json!({"kind": "cat"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let objects = body_json(response).await;
    assert_eq!(objects["objects"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn writing_to_an_unknown_collection_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    let response = app
        .oneshot(json_request(
            "POST",
            "/collections/ghost/objects",
            json!({"name": "Jo"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_then_delete_object() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(&temp_dir);

    app.clone()
        .oneshot(json_request("POST", "/collections", json!({"name": "people"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/collections/people/objects",
            json!({"id": "a", "age": 10}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/collections/people/objects/a",
            json!({"age": 11}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/collections/people/delete",
            json!({"id": "a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deleteCount"], 1);
}
