// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Micropub request parsing.
//!
//! Turns a form-encoded create request into one of the supported post
//! kinds:
//! - Content-Type check (form-encoded only)
//! - Access token lookup (header or form field)
//! - `h` presence and kind dispatch
//! - Kind-specific required fields
//! - URL format validation for `bookmark-of`

use crate::error::{AppError, Result};
use axum::http::{header, HeaderMap};
use tracing::debug;
use url::Url;

/// Parsed `application/x-www-form-urlencoded` request body.
#[derive(Debug, Clone, Default)]
pub struct MicropubForm {
    pairs: Vec<(String, String)>,
}

impl MicropubForm {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First non-blank value for `key`, also matching the `key[]` array form.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key || k.strip_suffix("[]") == Some(key))
            .map(|(_, v)| v.as_str())
            .find(|v| !v.trim().is_empty())
    }

    /// Like [`MicropubForm::get`], but a missing value is an error.
    pub fn require(&self, key: &'static str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            debug!(param = key, "Missing required parameter");
            AppError::MissingParameter(key)
        })
    }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Only form-encoded bodies are accepted. Parameters such as `charset` are
/// ignored; a missing header is rejected.
pub fn require_form_content_type(headers: &HeaderMap) -> Result<()> {
    let actual = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let essence = actual
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_lowercase());

    if essence.as_deref() == Some(FORM_CONTENT_TYPE) {
        return Ok(());
    }

    debug!(content_type = ?actual, "Content-Type invalid");
    Err(AppError::UnsupportedMediaType { actual })
}

/// Extract the access token, preferring an `Authorization: Bearer` header
/// over the `access_token` form field.
pub fn access_token<'a>(headers: &'a HeaderMap, form: &'a MicropubForm) -> Option<&'a str> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_header.or_else(|| form.get("access_token"))
}

/// A create request for one of the supported post kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Post {
    Bookmark { bookmark_of: String },
    Note { content: String },
}

impl Post {
    /// Dispatch on `h`. Unknown kinds are rejected rather than ignored.
    pub fn from_form(form: &MicropubForm) -> Result<Self> {
        match form.require("h")? {
            "bookmark" => {
                let target = form.require("bookmark-of")?;
                validate_http_url("bookmark-of", target)?;
                Ok(Post::Bookmark {
                    bookmark_of: target.trim().to_string(),
                })
            }
            "note" => Ok(Post::Note {
                content: form.require("content")?.to_string(),
            }),
            other => {
                debug!(kind = %other, "Unsupported post kind");
                Err(AppError::UnsupportedKind(other.to_string()))
            }
        }
    }

    /// Value of `h` in the request.
    pub fn kind(&self) -> &'static str {
        match self {
            Post::Bookmark { .. } => "bookmark",
            Post::Note { .. } => "note",
        }
    }

    /// Content-type category stored with the entry.
    pub fn content_type(&self) -> &'static str {
        match self {
            Post::Bookmark { .. } => "bookmarks",
            Post::Note { .. } => "notes",
        }
    }

    pub fn commit_message(&self) -> &'static str {
        match self {
            Post::Bookmark { .. } => "Adding Bookmark",
            Post::Note { .. } => "Adding Note",
        }
    }
}

/// Only absolute http/https URLs with a host are accepted.
fn validate_http_url(param: &'static str, value: &str) -> Result<()> {
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => {
            debug!(param, url = %value, "Invalid URL (bad format, scheme or no host)");
            Err(AppError::InvalidUrl {
                param,
                url: value.to_string(),
            })
        }
    }
}
