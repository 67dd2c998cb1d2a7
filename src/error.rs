// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types and their HTTP response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type alias for request handling.
pub type Result<T> = std::result::Result<T, AppError>;

/// Request handling errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no access token supplied")]
    MissingToken,

    #[error("access token could not be verified")]
    Unauthorized,

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid URL format for {param}: {url}")]
    InvalidUrl { param: &'static str, url: String },

    #[error("unsupported post kind: {0}")]
    UnsupportedKind(String),

    #[error("unsupported content type {actual:?}: expected application/x-www-form-urlencoded")]
    UnsupportedMediaType { actual: Option<String> },

    #[error("missing callback parameter: {0}")]
    MissingCallbackParameter(&'static str),

    #[error("authorization state is unknown, expired or already used")]
    StateMismatch,

    #[error("callback identity {0} is not the site owner")]
    IdentityMismatch(String),

    #[error("too many authorization requests in progress")]
    TooManyPendingStates,

    #[error("upstream error from {endpoint}: {message}")]
    Upstream { endpoint: String, message: String },

    #[error("upstream timeout from {endpoint}")]
    UpstreamTimeout { endpoint: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body, shaped like a Micropub error.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub error_description: String,
}

impl AppError {
    pub fn upstream(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Map a transport failure, keeping timeouts distinct.
    pub fn from_transport(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            Self::upstream(endpoint, err.to_string())
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingParameter(_) | Self::InvalidUrl { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::UnsupportedKind(_)
            | Self::MissingCallbackParameter(_)
            | Self::StateMismatch
            | Self::IdentityMismatch(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooManyPendingStates => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for the response body.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken | Self::Unauthorized => "unauthorized",
            Self::MissingParameter(_)
            | Self::InvalidUrl { .. }
            | Self::UnsupportedKind(_)
            | Self::MissingCallbackParameter(_)
            | Self::UnsupportedMediaType { .. }
            | Self::StateMismatch
            | Self::IdentityMismatch(_) => "invalid_request",
            Self::TooManyPendingStates => "temporarily_unavailable",
            Self::Upstream { .. } => "upstream_error",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::Internal(_) => "server_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.error_code(),
                error_description: self.to_string(),
            }),
        )
            .into_response()
    }
}
