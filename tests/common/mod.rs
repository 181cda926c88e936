#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use video_store::config::StoreConfig;
use video_store::services::storage::LocalVideoStorage;
use video_store::{AppState, create_app};

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub struct TestApp {
    pub app: Router,
    pub upload_dir: PathBuf,
    pub root: TempDir,
}

pub async fn setup() -> TestApp {
    setup_with(|_| {}).await
}

pub async fn setup_with(customize: impl FnOnce(&mut StoreConfig)) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let upload_dir = root.path().join("uploads");

    let mut config = StoreConfig::development(&upload_dir);
    customize(&mut config);

    let storage = Arc::new(LocalVideoStorage::new(&upload_dir).await.unwrap());
    let app = create_app(AppState::new(storage, config));

    TestApp {
        app,
        upload_dir,
        root,
    }
}

/// One multipart part; `filename: None` produces a plain form value.
pub fn part(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"", field),
    };

    let mut bytes = format!("--{}\r\n{}\r\n\r\n", BOUNDARY, disposition).into_bytes();
    bytes.extend_from_slice(content);
    bytes.extend_from_slice(b"\r\n");
    bytes
}

pub fn multipart_body(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut body: Vec<u8> = parts.concat();
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn upload(app: &Router, filename: &str, content: &[u8]) -> (StatusCode, Value) {
    let body = multipart_body(&[part("file", Some(filename), content)]);
    let response = send(app, upload_request(body)).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("invalid JSON ({}): {:?}", e, String::from_utf8_lossy(&body)))
}

pub async fn listed_filenames(app: &Router) -> Vec<String> {
    let response = get(app, "/video-list").await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut names: Vec<String> = body_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["filename"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

pub fn stored_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
