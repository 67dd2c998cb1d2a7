// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Content entries and their repository encoding.
//!
//! An accepted post becomes a JSON data entry stored at
//! `YYYY/MM/<slug>.md` in the content repository. The contents API takes
//! file bodies as base64, so the serialized entry is encoded here.

use crate::error::{AppError, Result};
use crate::micropub::Post;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Microformats kind tag for every entry.
pub const ENTRY_KIND: &str = "h-entry";

/// Kind-specific properties, each a microformats-style value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryProperties {
    pub published: Vec<String>,

    #[serde(rename = "bookmark-of", default, skip_serializing_if = "Vec::is_empty")]
    pub bookmark_of: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<String>,

    #[serde(rename = "post-status")]
    pub post_status: Vec<String>,
}

/// A publishable data entry as stored in the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// RFC 3339 creation time
    pub date: String,
    pub deleted: bool,
    pub draft: bool,
    pub h: String,
    pub properties: EntryProperties,
    /// Content-type category, e.g. `bookmarks`
    #[serde(rename = "type")]
    pub kind: String,
    /// `YYYY/MM/<slug>`
    pub slug: String,
    pub client_id: String,
}

/// An entry ready for the contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedEntry {
    /// File path relative to the content directory, `YYYY/MM/<slug>.md`
    pub path: String,
    /// Public path below the site's data section, `YYYY/MM/<slug>`
    pub slug_path: String,
    /// Base64 of the compact JSON entry
    pub content: String,
}

/// `YYYY/MM/<slug>` for a publish time.
pub fn slug_path(slug: &str, timestamp: DateTime<Utc>) -> String {
    format!("{:04}/{:02}/{}", timestamp.year(), timestamp.month(), slug)
}

impl ContentEntry {
    pub fn new(post: &Post, slug: &str, timestamp: DateTime<Utc>, client_id: &str) -> Self {
        let published = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);

        let (bookmark_of, content) = match post {
            Post::Bookmark { bookmark_of } => (vec![bookmark_of.clone()], Vec::new()),
            Post::Note { content } => (Vec::new(), vec![content.clone()]),
        };

        Self {
            date: published.clone(),
            deleted: false,
            draft: false,
            h: ENTRY_KIND.to_string(),
            properties: EntryProperties {
                published: vec![published],
                bookmark_of,
                content,
                post_status: vec!["published".to_string()],
            },
            kind: post.content_type().to_string(),
            slug: slug_path(slug, timestamp),
            client_id: client_id.to_string(),
        }
    }

    /// Compact JSON, base64-encoded for transport.
    pub fn to_base64(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| AppError::Internal(format!("failed to serialize entry: {}", e)))?;
        Ok(STANDARD.encode(json))
    }

    /// Inverse of [`ContentEntry::to_base64`].
    pub fn from_base64(encoded: &str) -> Result<Self> {
        // The contents API wraps base64 at 60 columns when returning files
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| AppError::Internal(format!("invalid base64 entry: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Internal(format!("invalid entry JSON: {}", e)))
    }
}

/// Build and encode the entry for a post.
pub fn encode(
    post: &Post,
    slug: &str,
    timestamp: DateTime<Utc>,
    client_id: &str,
) -> Result<SerializedEntry> {
    let entry = ContentEntry::new(post, slug, timestamp, client_id);
    Ok(SerializedEntry {
        path: format!("{}.md", entry.slug),
        content: entry.to_base64()?,
        slug_path: entry.slug,
    })
}
