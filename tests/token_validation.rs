// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Token introspection tests against a fake token endpoint.

mod harness;

use harness::*;
use micropub_endpoint::error::AppError;
use micropub_endpoint::token::TokenValidator;
use micropub_endpoint::Config;
use std::time::Duration;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn validator(server: &MockServer) -> TokenValidator {
    validator_for(&config_for(server))
}

fn validator_for(config: &Config) -> TokenValidator {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .unwrap();
    TokenValidator::new(client, config)
}

async fn respond_with(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_owner_token_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(header_is("authorization", "Bearer good-token"))
        .and(header_is("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "me": IDENTITY })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(validator(&server).validate(GOOD_TOKEN).await);
    server.verify().await;
}

#[tokio::test]
async fn test_identity_must_match_exactly() {
    for me in [
        "https://someone-else.example/",
        "http://example.com/",
        "https://example.com",
        "https://example.com/~other",
        "",
    ] {
        let server = MockServer::start().await;
        respond_with(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "me": me })),
        )
        .await;

        assert!(!validator(&server).validate(GOOD_TOKEN).await, "me {me:?} accepted");
    }
}

#[tokio::test]
async fn test_every_token_is_introspected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "me": IDENTITY })))
        .expect(3)
        .mount(&server)
        .await;

    let validator = validator(&server);
    for _ in 0..3 {
        assert!(validator.validate(GOOD_TOKEN).await);
    }
    server.verify().await;
}

#[tokio::test]
async fn test_fails_closed() {
    let cases = [
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "scope": "create" })),
        ResponseTemplate::new(200).set_body_string("me=https://example.com/"),
        ResponseTemplate::new(401).set_body_json(serde_json::json!({ "me": IDENTITY })),
        ResponseTemplate::new(500),
    ];

    for template in cases {
        let server = MockServer::start().await;
        respond_with(&server, template).await;
        assert!(!validator(&server).validate(GOOD_TOKEN).await);
    }
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "me": IDENTITY }))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let validator = validator(&server);
    assert!(matches!(
        validator.introspect(GOOD_TOKEN).await,
        Err(AppError::UpstreamTimeout { .. })
    ));
    assert!(!validator.validate(GOOD_TOKEN).await);
}

#[tokio::test]
async fn test_unreachable_provider_rejected() {
    let validator = validator_for(&config_with_base(&closed_base_url()));

    assert!(matches!(
        validator.introspect(GOOD_TOKEN).await,
        Err(AppError::Upstream { .. })
    ));
    assert!(!validator.validate(GOOD_TOKEN).await);
}

#[tokio::test]
async fn test_introspection_returns_assertion() {
    let server = MockServer::start().await;
    mount_identity(&server, GOOD_TOKEN, IDENTITY).await;

    let assertion = validator(&server).introspect(GOOD_TOKEN).await.unwrap();
    assert_eq!(assertion.me, IDENTITY);
    assert_eq!(assertion.client_id.as_deref(), Some(APP_URL));
    assert_eq!(assertion.scope.as_deref(), Some("create"));
    assert_eq!(assertion.issued_at, Some(1715000000));
}
