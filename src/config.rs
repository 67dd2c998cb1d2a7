// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the Micropub endpoint.
//!
//! Loaded once at startup from environment variables and shared read-only
//! with every handler. Nested sections use a `__` separator, so
//! `INDIEAUTH__TOKEN_ENDPOINT` sets `indieauth.token_endpoint`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid URL for {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("invalid repository {0:?}: expected owner/name")]
    InvalidRepository(String),
}

/// Configuration for the Micropub endpoint service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Public base URL of this service; doubles as the IndieAuth client id
    #[serde(default)]
    pub app_url: String,

    /// Bearer credential for the repository contents API
    #[serde(default)]
    pub github_api_key: String,

    /// Root URL of the published site
    #[serde(default)]
    pub site_url: String,

    /// Content repository as `owner/name`
    #[serde(default)]
    pub github_repository: String,

    /// Branch to commit to (default: the repository's default branch)
    #[serde(default)]
    pub github_branch: Option<String>,

    /// IndieAuth provider configuration
    #[serde(default)]
    pub indieauth: IndieAuthConfig,

    /// Repository contents API configuration
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Outbound HTTP configuration
    #[serde(default)]
    pub http: HttpConfig,
}

/// IndieAuth provider endpoints and site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndieAuthConfig {
    /// Site owner identity (default: `site_url`), canonicalised at load
    #[serde(default)]
    pub me: Option<String>,

    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,

    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Scope requested during authorization (default: create)
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Lifetime of an issued state nonce in seconds (default: 600)
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

/// Contents API settings for the target repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Value of the `X-GitHub-Api-Version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Directory inside the repository that holds data entries
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    #[serde(default = "default_committer_name")]
    pub committer_name: String,

    /// Committer email (default: micropub@<site host>)
    #[serde(default)]
    pub committer_email: Option<String>,
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request (default: 5)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_authorization_endpoint() -> String {
    "https://indieauth.com/auth".to_string()
}

fn default_token_endpoint() -> String {
    "https://tokens.indieauth.com/token".to_string()
}

fn default_scope() -> String {
    "create".to_string()
}

fn default_state_ttl_secs() -> u64 {
    600
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_api_version() -> String {
    "2022-11-28".to_string()
}

fn default_content_dir() -> String {
    "content/data".to_string()
}

fn default_committer_name() -> String {
    "Micropub".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for IndieAuthConfig {
    fn default() -> Self {
        Self {
            me: None,
            authorization_endpoint: default_authorization_endpoint(),
            token_endpoint: default_token_endpoint(),
            scope: default_scope(),
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_version: default_api_version(),
            content_dir: default_content_dir(),
            committer_name: default_committer_name(),
            committer_email: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Build a configuration from the four required settings, with every
    /// other field at its default. The result is already validated.
    pub fn new(
        app_url: impl Into<String>,
        github_api_key: impl Into<String>,
        site_url: impl Into<String>,
        github_repository: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self {
            bind_addr: default_bind_addr(),
            app_url: app_url.into(),
            github_api_key: github_api_key.into(),
            site_url: site_url.into(),
            github_repository: github_repository.into(),
            github_branch: None,
            indieauth: IndieAuthConfig::default(),
            repository: RepositoryConfig::default(),
            http: HttpConfig::default(),
        }
        .validated()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        Self::from_settings(settings)
    }

    /// Deserialize and validate an already-assembled settings tree.
    pub fn from_settings(settings: config::Config) -> Result<Self, ConfigError> {
        settings.try_deserialize::<Config>()?.validated()
    }

    /// Check required settings and canonicalise URLs.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        // Identity defaults to the site URL as given, before any trimming
        let raw_site_url = self.site_url.trim().to_string();
        self.app_url = required_url("APP_URL", &self.app_url)?;
        self.site_url = required_url("SITE_URL", &self.site_url)?;

        if self.github_api_key.trim().is_empty() {
            return Err(ConfigError::Missing("GITHUB_API_KEY"));
        }

        let repository = self.github_repository.trim().to_string();
        if repository.is_empty() {
            return Err(ConfigError::Missing("GITHUB_REPOSITORY"));
        }
        match repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {}
            _ => return Err(ConfigError::InvalidRepository(repository)),
        }
        self.github_repository = repository;

        let me = self
            .indieauth
            .me
            .clone()
            .unwrap_or(raw_site_url);
        self.indieauth.me = Some(canonical_identity(&me)?);

        parse_http_url("INDIEAUTH__AUTHORIZATION_ENDPOINT", &self.indieauth.authorization_endpoint)?;
        parse_http_url("INDIEAUTH__TOKEN_ENDPOINT", &self.indieauth.token_endpoint)?;
        self.repository.api_base =
            required_url("REPOSITORY__API_BASE", &self.repository.api_base)?;
        self.repository.content_dir = self.repository.content_dir.trim_matches('/').to_string();

        if self.github_branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
            self.github_branch = None;
        }

        Ok(self)
    }

    /// Canonical site owner identity used for token verification.
    pub fn identity(&self) -> &str {
        self.indieauth.me.as_deref().unwrap_or(&self.site_url)
    }

    /// IndieAuth client identifier (the service's own base URL).
    pub fn client_id(&self) -> &str {
        &self.app_url
    }

    /// Callback URL registered with the authorization endpoint.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.app_url)
    }

    /// Repository owner and name.
    pub fn repository_parts(&self) -> (&str, &str) {
        self.github_repository
            .split_once('/')
            .unwrap_or((self.github_repository.as_str(), ""))
    }

    /// Committer email, derived from the site host when unset.
    pub fn committer_email(&self) -> String {
        if let Some(email) = &self.repository.committer_email {
            return email.clone();
        }
        let host = Url::parse(&self.site_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());
        format!("micropub@{}", host)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.indieauth.state_ttl_secs)
    }
}

/// Canonicalise a site identity URL: `https` scheme, `/` root path, no
/// fragment. `http://example.com` becomes `https://example.com/`.
pub fn canonical_identity(raw: &str) -> Result<String, ConfigError> {
    let mut url = parse_http_url("INDIEAUTH__ME", raw)?;
    if url.scheme() == "http" && url.set_scheme("https").is_err() {
        return Err(ConfigError::InvalidUrl {
            key: "INDIEAUTH__ME",
            value: raw.to_string(),
        });
    }
    url.set_fragment(None);
    Ok(url.to_string())
}

fn parse_http_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
    };
    let url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

/// Validate a required base URL and strip any trailing slash.
fn required_url(key: &'static str, value: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(key));
    }
    parse_http_url(key, value)?;
    Ok(value.trim().trim_end_matches('/').to_string())
}
