//! Shared helpers: in-memory router and request plumbing.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use storekeep_api::config::{ApiConfig, token_settings};
use storekeep_api::{AppState, router};
use storekeep_core::store::{MemoryProductStore, MemoryUserStore, ProductStore, UserStore};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub fn config() -> ApiConfig {
    ApiConfig::new(
        "127.0.0.1:0",
        "",
        SECRET,
        token_settings(900, 604_800).unwrap(),
        Duration::from_secs(2),
        false,
    )
    .unwrap()
}

pub fn app_with(users: Arc<dyn UserStore>, products: Arc<dyn ProductStore>) -> Router {
    let state = AppState::new(config(), users, products).expect("app state");
    router(state)
}

pub fn app() -> Router {
    app_with(
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryProductStore::new()),
    )
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    /// `name=value` pair of the refresh cookie, ready for a `Cookie` header.
    pub fn refresh_cookie_pair(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|c| c.split(';').next().map(str::to_string))
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("refresh_token="))
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    Reply {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn register(app: &Router, username: &str, profile: Option<&str>) -> Reply {
    let mut body = json!({
        "name": username,
        "username": username,
        "email": format!("{username}@x.com"),
        "password": "secret123",
    });
    if let Some(profile) = profile {
        body["profile"] = json!(profile);
    }
    send(app, json_request("POST", "/auth/register", None, body)).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> Reply {
    send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await
}

/// Register and log in; returns the user id and access token.
pub async fn signed_in(app: &Router, username: &str, profile: Option<&str>) -> (i64, String) {
    let created = register(app, username, profile).await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let reply = login(app, username, "secret123").await;
    assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
    (
        created.body["user"]["id"].as_i64().unwrap(),
        reply.body["access_token"].as_str().unwrap().to_string(),
    )
}
