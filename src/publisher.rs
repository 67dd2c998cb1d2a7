// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Repository publisher.
//!
//! Writes an encoded entry to the content repository through the GitHub
//! contents API (`PUT /repos/{owner}/{repo}/contents/{path}`) and derives
//! the public URL the site will serve it from.

use crate::config::Config;
use crate::entry::SerializedEntry;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Site section that serves data entries.
const PUBLIC_SECTION: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// Body of a create-or-update file request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub message: String,
    pub committer: Committer,
    /// Base64 file content
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Publishes entries to the content repository.
#[derive(Debug, Clone)]
pub struct RepositoryPublisher {
    client: reqwest::Client,
    contents_url: String,
    api_key: String,
    api_version: String,
    branch: Option<String>,
    committer: Committer,
    site_url: String,
}

impl RepositoryPublisher {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        let (owner, repo) = config.repository_parts();
        let contents_url = if config.repository.content_dir.is_empty() {
            format!("{}/repos/{}/{}/contents", config.repository.api_base, owner, repo)
        } else {
            format!(
                "{}/repos/{}/{}/contents/{}",
                config.repository.api_base, owner, repo, config.repository.content_dir
            )
        };

        Self {
            client,
            contents_url,
            api_key: config.github_api_key.clone(),
            api_version: config.repository.api_version.clone(),
            branch: config.github_branch.clone(),
            committer: Committer {
                name: config.repository.committer_name.clone(),
                email: config.committer_email(),
            },
            site_url: config.site_url.clone(),
        }
    }

    /// Public URL an entry will be served from.
    pub fn public_url(&self, entry: &SerializedEntry) -> String {
        format!("{}/{}/{}", self.site_url, PUBLIC_SECTION, entry.slug_path)
    }

    /// Commit the entry and return its public URL. Nothing is reported as
    /// published unless the API answers with a success status.
    pub async fn publish(&self, entry: &SerializedEntry, message: &str) -> Result<String> {
        let url = format!("{}/{}", self.contents_url, entry.path);
        let body = CommitRequest {
            message: message.to_string(),
            committer: self.committer.clone(),
            content: entry.content.clone(),
            branch: self.branch.clone(),
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %url, error = %e, "Repository write failed");
                AppError::from_transport(&url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(endpoint = %url, status = status.as_u16(), detail = %detail, "Repository rejected write");
            return Err(AppError::upstream(
                url,
                format!("contents API returned {}", status),
            ));
        }

        let location = self.public_url(entry);
        info!(path = %entry.path, status = status.as_u16(), location = %location, "Entry committed");
        Ok(location)
    }
}
