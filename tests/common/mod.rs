//! Shared helpers for the router-level tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bookmarker::config::Config;
use bookmarker::database::AppState;
use bookmarker::route::create_app;

/// Config whose every path points inside `dir`
pub fn test_config(dir: &TempDir) -> Config {
    Config {
        document_store_url: dir.path().join("db").to_string_lossy().into_owned(),
        bookmarks_file: dir.path().join("bookmarks.json"),
        users_file: dir.path().join("users.json"),
        ..Config::default()
    }
}

/// App backed by a fresh document store in a temporary directory
pub fn setup_test_app() -> (Router, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = AppState::from_config(&test_config(&dir));
    (create_app(state), dir)
}

/// App whose document store cannot be opened, so only the JSON files serve
pub fn setup_file_only_app() -> (Router, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let config = Config {
        document_store_url: blocker.to_string_lossy().into_owned(),
        ..test_config(&dir)
    };
    let state = AppState::from_config(&config);
    assert!(!state.bookmarks.has_primary());
    (create_app(state), dir)
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(
    app: &Router,
    uri: &str,
    form: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(form.to_string())).unwrap())
        .await
        .unwrap()
}

/// `session=...` pair from the response's `Set-Cookie` header
pub fn session_cookie(response: &Response<Body>) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets no cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().trim().to_string()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("Failed to parse JSON")
}

/// Signs up `username` and returns the logged-in session cookie
pub async fn signed_up(app: &Router, username: &str) -> String {
    let form = format!(
        "username={0}&email={0}%40example.com&password=password123",
        username
    );
    let response = post_form(app, "/signup", &form, None).await;
    assert_eq!(location(&response), "/");
    session_cookie(&response)
}

/// Adds a bookmark and returns the redirect response
pub async fn add(app: &Router, cookie: &str, name: &str, url: &str, notes: &str) -> Response<Body> {
    let form = format!("custom_name={}&url={}&notes={}", name, url, notes);
    post_form(app, "/add", &form, Some(cookie)).await
}

/// Body of the page the session is redirected to next, with its flashes
pub async fn page(app: &Router, uri: &str, cookie: &str) -> String {
    body_text(get(app, uri, Some(cookie)).await).await
}
