// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared fixtures for the integration tests.
//!
//! The identity provider and the repository API are both faked by a single
//! wiremock server; configuration points every outbound endpoint at it.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use micropub_endpoint::{build_router, AppState, Config};
use std::sync::Arc;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SITE_URL: &str = "https://example.com";
pub const IDENTITY: &str = "https://example.com/";
pub const APP_URL: &str = "https://app.example.com";
pub const GITHUB_KEY: &str = "gh-secret";
pub const GOOD_TOKEN: &str = "good-token";

/// Configuration with every remote endpoint on the mock server.
pub fn config_for(server: &MockServer) -> Config {
    config_with_base(&server.uri())
}

/// Configuration with every remote endpoint below `base`.
pub fn config_with_base(base: &str) -> Config {
    let mut config = Config::new(APP_URL, GITHUB_KEY, SITE_URL, "owner/site").unwrap();
    config.indieauth.authorization_endpoint = format!("{}/auth", base);
    config.indieauth.token_endpoint = format!("{}/token", base);
    config.repository.api_base = base.to_string();
    config.http.timeout_secs = 1;
    config
}

/// Base URL of a local port with nothing listening on it.
///
/// Not a `MockServer`: pooled mock servers keep listening after drop.
pub fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn app(config: Config) -> Router {
    build_router(Arc::new(AppState::new(config).unwrap()))
}

/// Answer introspection of `token` with identity `me`.
pub async fn mount_identity(server: &MockServer, token: &str, me: &str) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(header_is("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "me": me,
            "issued_by": "https://tokens.indieauth.com/token",
            "client_id": APP_URL,
            "issued_at": 1715000000,
            "scope": "create",
            "nonce": 12345
        })))
        .mount(server)
        .await;
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Requests the mock server received on the repository contents API.
pub async fn repository_writes(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().starts_with("/repos/"))
        .collect()
}
