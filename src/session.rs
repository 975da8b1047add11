//! Session lifecycle: one rendering backend per batch, proxy rotation.

use crate::fetch::{HttpSession, PageFetcher, SessionConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// An acquired rendering session, exclusively owned by the orchestrator for
/// one batch. Dropping it is the release: it runs on every exit path,
/// including mid-batch failure.
pub struct Session {
    fetcher: Arc<dyn PageFetcher>,
    proxy: Option<String>,
}

impl Session {
    pub fn new(fetcher: Arc<dyn PageFetcher>, proxy: Option<String>) -> Self {
        Self { fetcher, proxy }
    }

    pub fn fetcher(&self) -> &dyn PageFetcher {
        self.fetcher.as_ref()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Session released (proxy: {})", self.proxy.as_deref().unwrap_or("none"));
    }
}

/// Produces ready-to-use sessions; mocked in orchestrator tests.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self, batch_index: usize) -> Result<Session>;
}

/// Builds HTTP sessions with the configured fingerprint and a proxy chosen
/// round-robin over the pool by batch index.
pub struct SessionManager {
    fingerprint: SessionConfig,
    proxies: Vec<String>,
}

impl SessionManager {
    pub fn new(fingerprint: SessionConfig, proxies: Vec<String>) -> Self {
        Self { fingerprint, proxies }
    }

    /// Proxy endpoint for a batch: `pool[batch % len]`, or none for an empty
    /// pool.
    pub fn proxy_for_batch(&self, batch_index: usize) -> Option<&str> {
        if self.proxies.is_empty() {
            None
        } else {
            Some(self.proxies[batch_index % self.proxies.len()].as_str())
        }
    }
}

#[async_trait]
impl SessionProvider for SessionManager {
    async fn acquire(&self, batch_index: usize) -> Result<Session> {
        let proxy = self.proxy_for_batch(batch_index).map(String::from);
        info!(
            "Starting session for batch {} (proxy: {}, timezone: {})",
            batch_index,
            proxy.as_deref().unwrap_or("none"),
            self.fingerprint.timezone
        );

        let config = SessionConfig { proxy: proxy.clone(), ..self.fingerprint.clone() };
        let fetcher =
            HttpSession::new(config).context("Failed to start rendering session")?;

        Ok(Session::new(Arc::new(fetcher), proxy))
    }
}
