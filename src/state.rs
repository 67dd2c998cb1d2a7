// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Authorization state nonces.
//!
//! Every redirect to the authorization endpoint carries a fresh nonce. The
//! callback must present a nonce that was issued here, has not expired and
//! has not been used before.

use crate::slug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Maximum number of outstanding nonces.
pub const MAX_PENDING: usize = 1024;

/// Thread-safe store of issued state nonces.
#[derive(Debug, Clone)]
pub struct StateStore {
    /// How long an issued nonce stays valid
    ttl: Duration,
    /// Nonce -> issue time
    issued: Arc<RwLock<HashMap<String, Instant>>>,
}

impl StateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issue and remember a new nonce.
    ///
    /// Returns `None` when `MAX_PENDING` live nonces are outstanding. Live
    /// nonces are never evicted, so a flood of redirects cannot invalidate
    /// a login already in progress.
    pub async fn issue(&self) -> Option<String> {
        let now = Instant::now();

        let mut issued = self.issued.write().await;
        if issued.len() >= MAX_PENDING {
            let ttl = self.ttl;
            issued.retain(|_, at| now.duration_since(*at) < ttl);
        }
        if issued.len() >= MAX_PENDING {
            warn!(pending = issued.len(), "Pending authorization states at capacity");
            return None;
        }

        let nonce = slug::state_nonce();
        issued.insert(nonce.clone(), now);
        Some(nonce)
    }

    /// Consume a nonce. Returns true only for a live, previously issued
    /// nonce; a nonce can be consumed once.
    pub async fn consume(&self, state: &str) -> bool {
        let mut issued = self.issued.write().await;
        match issued.remove(state) {
            Some(at) if at.elapsed() < self.ttl => true,
            Some(_) => {
                debug!("Authorization state expired");
                false
            }
            None => {
                debug!("Authorization state unknown");
                false
            }
        }
    }

    /// Number of outstanding nonces.
    pub async fn pending(&self) -> usize {
        self.issued.read().await.len()
    }

    /// Drop expired nonces (should be called periodically).
    pub async fn cleanup(&self) {
        let ttl = self.ttl;
        let mut issued = self.issued.write().await;
        issued.retain(|_, at| at.elapsed() < ttl);
    }
}
