// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the Micropub endpoint.

use crate::config::Config;
use crate::entry;
use crate::error::{AppError, Result};
use crate::indieauth::{AuthFlow, CallbackParams};
use crate::micropub::{self, MicropubForm, Post};
use crate::publisher::RepositoryPublisher;
use crate::slug;
use crate::token::TokenValidator;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenValidator,
    pub auth: AuthFlow,
    pub publisher: RepositoryPublisher,
}

impl AppState {
    /// Wire every component to one HTTP client with the configured timeout.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            tokens: TokenValidator::new(client.clone(), &config),
            auth: AuthFlow::new(client.clone(), &config),
            publisher: RepositoryPublisher::new(client, &config),
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Token exchange result returned to the caller.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create a post.
///
/// Order matters: a missing token is reported first, the body encoding is
/// checked before the token is verified, and nothing is sent to the
/// repository until the request is known to be complete.
pub async fn micropub(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let form = MicropubForm::parse(&body);

    let token = micropub::access_token(&headers, &form).ok_or_else(|| {
        info!("Micropub request without access token");
        AppError::MissingToken
    })?;

    // Reject other encodings before the token leaves this service.
    micropub::require_form_content_type(&headers)?;

    if !state.tokens.validate(token).await {
        warn!("Micropub request with unverifiable token");
        return Err(AppError::Unauthorized);
    }

    let post = Post::from_form(&form)?;
    let slug = slug::generate();
    let encoded = entry::encode(&post, &slug, Utc::now(), state.config.client_id())?;
    debug!(kind = post.kind(), path = %encoded.path, "Publishing entry");

    let location = state
        .publisher
        .publish(&encoded, post.commit_message())
        .await?;

    info!(kind = post.kind(), slug = %slug, location = %location, "Post created");
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

/// Start the IndieAuth flow with a permanent redirect.
pub async fn auth(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let url = state.auth.authorization_url().await?;
    Ok(Redirect::permanent(url.as_str()))
}

/// Finish the IndieAuth flow and hand the access token back as JSON.
pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<AccessTokenResponse>> {
    let access_token = state.auth.complete(params).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}
