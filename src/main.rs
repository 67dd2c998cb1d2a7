// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Micropub Endpoint Service
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env`):
//!
//! - `APP_URL`: public base URL of this service (required)
//! - `GITHUB_API_KEY`: contents API credential (required)
//! - `SITE_URL`: root URL of the published site (required)
//! - `GITHUB_REPOSITORY`: content repository as `owner/name` (required)
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `HTTP__TIMEOUT_SECS`: outbound request timeout (default: 5)
//!
//! See [`micropub_endpoint::config`] for the remaining settings.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use micropub_endpoint::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        app_url = %config.app_url,
        identity = %config.identity(),
        repository = %config.github_repository,
        timeout_secs = config.http.timeout_secs,
        "Starting Micropub endpoint"
    );

    let state = Arc::new(AppState::new(config.clone())?);

    // Expire abandoned authorization states
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.auth.states().cleanup().await;
        }
    });

    let app = build_router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
