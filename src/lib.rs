// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Micropub Endpoint
//!
//! Accepts Micropub create requests from the site owner and publishes them
//! as data entries in a GitHub-hosted content repository:
//!
//! - Bearer token verification against an IndieAuth token endpoint
//! - IndieAuth redirect/callback flow with single-use state nonces
//! - Bookmark and note posts encoded as JSON data entries
//! - Commits through the repository contents API

pub mod config;
pub mod entry;
pub mod error;
pub mod handlers;
pub mod indieauth;
pub mod micropub;
pub mod publisher;
pub mod slug;
pub mod state;
pub mod token;

pub use self::config::Config;
pub use error::AppError;
pub use handlers::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/micropub", post(handlers::micropub))
        .route("/auth", get(handlers::auth))
        .route("/auth/callback", get(handlers::auth_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
