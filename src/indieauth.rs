// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! IndieAuth authorization flow.
//!
//! Two steps: redirect the site owner to the authorization endpoint with a
//! fresh state nonce, then on callback check that `me` is the site owner,
//! verify that nonce and exchange the authorization code for an access token
//! at the token endpoint.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::state::StateStore;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Query parameters delivered to the callback. All optional so that a
/// malformed callback is reported, not rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub me: Option<String>,
    pub state: Option<String>,
}

/// Token endpoint response in its JSON form.
#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
}

/// Drives the redirect/callback round trip.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    client: reqwest::Client,
    authorization_endpoint: String,
    token_endpoint: String,
    me: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    states: StateStore,
}

impl AuthFlow {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            authorization_endpoint: config.indieauth.authorization_endpoint.clone(),
            token_endpoint: config.indieauth.token_endpoint.clone(),
            me: config.identity().to_string(),
            client_id: config.client_id().to_string(),
            redirect_uri: config.redirect_uri(),
            scope: config.indieauth.scope.clone(),
            states: StateStore::new(config.state_ttl()),
        }
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// Issue a state nonce and build the authorization redirect URL.
    pub async fn authorization_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.authorization_endpoint).map_err(|e| {
            AppError::Internal(format!("invalid authorization endpoint: {}", e))
        })?;
        let state = self.states.issue().await.ok_or(AppError::TooManyPendingStates)?;

        url.query_pairs_mut()
            .append_pair("me", &self.me)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("client_id", &self.client_id)
            .append_pair("state", &state)
            .append_pair("scope", &self.scope)
            .append_pair("response_type", "code");

        debug!(endpoint = %self.authorization_endpoint, "Issued authorization redirect");
        Ok(url)
    }

    /// Verify the callback and exchange its code for an access token.
    pub async fn complete(&self, params: CallbackParams) -> Result<String> {
        let code = required(params.code, "code")?;
        let me = required(params.me, "me")?;
        if me != self.me {
            warn!(me = %me, expected = %self.me, "Rejected callback for another identity");
            return Err(AppError::IdentityMismatch(me));
        }
        let state = params.state.ok_or(AppError::StateMismatch)?;

        if !self.states.consume(&state).await {
            warn!("Rejected callback with unknown or reused state");
            return Err(AppError::StateMismatch);
        }

        self.exchange_code(&code, &me).await
    }

    /// POST the authorization code to the token endpoint.
    async fn exchange_code(&self, code: &str, me: &str) -> Result<String> {
        let form = [
            ("grant_type", "authorization_code"),
            ("me", me),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.token_endpoint, error = %e, "Token exchange failed");
                AppError::from_transport(&self.token_endpoint, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.token_endpoint, status = status.as_u16(), "Token endpoint rejected code");
            return Err(AppError::upstream(
                &self.token_endpoint,
                format!("token endpoint returned {}", status),
            ));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::from_transport(&self.token_endpoint, e))?;

        let token = if is_json {
            serde_json::from_slice::<TokenExchangeResponse>(&body)
                .ok()
                .and_then(|r| r.access_token)
        } else {
            url::form_urlencoded::parse(&body)
                .find(|(k, _)| k == "access_token")
                .map(|(_, v)| v.into_owned())
        };

        match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                info!(me = %me, "Access token issued");
                Ok(token)
            }
            None => Err(AppError::upstream(
                &self.token_endpoint,
                "response carried no access_token",
            )),
        }
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AppError::MissingCallbackParameter(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> AuthFlow {
        let config = Config::new(
            "https://app.example.com",
            "ghp_secret",
            "https://example.com",
            "owner/site",
        )
        .unwrap();
        AuthFlow::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_authorization_url() {
        let flow = flow();
        let url = flow.authorization_url().await.unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("indieauth.com"));
        assert_eq!(url.path(), "/auth");
        assert_eq!(pairs["me"], "https://example.com/");
        assert_eq!(pairs["redirect_uri"], "https://app.example.com/auth/callback");
        assert_eq!(pairs["client_id"], "https://app.example.com");
        assert_eq!(pairs["scope"], "create");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["state"].len(), crate::slug::STATE_LEN);
        assert_eq!(flow.states().pending().await, 1);
    }

    #[tokio::test]
    async fn test_missing_callback_parameters() {
        let flow = flow();

        let err = flow
            .complete(CallbackParams {
                code: None,
                me: Some("https://example.com/".into()),
                state: Some("x".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingCallbackParameter("code")));

        let err = flow
            .complete(CallbackParams {
                code: Some("abc".into()),
                me: Some("  ".into()),
                state: Some("x".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingCallbackParameter("me")));
    }

    #[tokio::test]
    async fn test_foreign_identity_rejected_before_state_is_used() {
        let flow = flow();
        let url = flow.authorization_url().await.unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        for me in ["https://attacker.example/", "http://example.com/", "https://example.com"] {
            let err = flow
                .complete(CallbackParams {
                    code: Some("abc".into()),
                    me: Some(me.into()),
                    state: Some(state.clone()),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::IdentityMismatch(ref m) if m == me), "{me}");
        }
        assert_eq!(flow.states().pending().await, 1, "state must not be consumed");
    }

    #[tokio::test]
    async fn test_full_state_store_refuses_redirect() {
        let flow = flow();
        for _ in 0..crate::state::MAX_PENDING {
            flow.authorization_url().await.unwrap();
        }
        assert!(matches!(
            flow.authorization_url().await,
            Err(AppError::TooManyPendingStates)
        ));
    }

    #[tokio::test]
    async fn test_state_mismatch_rejected_before_exchange() {
        let flow = flow();
        flow.authorization_url().await.unwrap();

        let err = flow
            .complete(CallbackParams {
                code: Some("abc".into()),
                me: Some("https://example.com/".into()),
                state: Some("forged".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StateMismatch));

        let err = flow
            .complete(CallbackParams {
                code: Some("abc".into()),
                me: Some("https://example.com/".into()),
                state: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StateMismatch));
    }
}
