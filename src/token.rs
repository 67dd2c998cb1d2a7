// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Access token verification against the IndieAuth token endpoint.
//!
//! Tokens are never cached; every request is introspected remotely and the
//! returned identity must equal the configured site identity exactly.

use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Token introspection result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Owner identity URI
    pub me: String,
    #[serde(default)]
    pub issued_by: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub issued_at: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub nonce: Option<i64>,
}

/// Verifies bearer tokens for the configured site owner.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    client: reqwest::Client,
    token_endpoint: String,
    identity: String,
}

impl TokenValidator {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            token_endpoint: config.indieauth.token_endpoint.clone(),
            identity: config.identity().to_string(),
        }
    }

    /// Ask the token endpoint who a token belongs to.
    pub async fn introspect(&self, token: &str) -> Result<IdentityAssertion> {
        let response = self
            .client
            .get(&self.token_endpoint)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::from_transport(&self.token_endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                &self.token_endpoint,
                format!("token endpoint returned {}", status),
            ));
        }

        response
            .json::<IdentityAssertion>()
            .await
            .map_err(|e| AppError::upstream(&self.token_endpoint, format!("undecodable response: {}", e)))
    }

    /// True only when the token resolves to the site owner. Any failure
    /// along the way counts as invalid.
    pub async fn validate(&self, token: &str) -> bool {
        match self.introspect(token).await {
            Ok(assertion) if assertion.me == self.identity => {
                debug!(client_id = ?assertion.client_id, scope = ?assertion.scope, "Token verified");
                true
            }
            Ok(assertion) => {
                warn!(me = %assertion.me, expected = %self.identity, "Token belongs to another identity");
                false
            }
            Err(err) => {
                warn!(endpoint = %self.token_endpoint, error = %err, "Token introspection failed");
                false
            }
        }
    }
}
