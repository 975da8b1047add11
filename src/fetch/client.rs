//! HTTP rendering backend using wreq for TLS fingerprint emulation.

use crate::fetch::{FetchError, FetchedDocument, PageFetcher, SessionConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Consecutive transport failures after which the session is declared lost.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// One rendering session: a cookie-carrying HTTP client bound to a proxy and
/// a fixed fingerprint. Created per batch, discarded at batch end.
pub struct HttpSession {
    client: Client,
    config: SessionConfig,
    consecutive_failures: AtomicU32,
}

impl HttpSession {
    /// Builds a session with the given fingerprint and optional proxy.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_millis(config.nav_timeout_ms))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self { client, config, consecutive_failures: AtomicU32::new(0) })
    }

    /// Proxy endpoint this session is bound to, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.config.proxy.as_deref()
    }

    fn record_failure(&self, cause: &FetchError) -> Option<FetchError> {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= MAX_CONSECUTIVE_FAILURES {
            warn!("Session degraded after {} consecutive failures", failures);
            return Some(FetchError::SessionLost(format!(
                "{} consecutive failures, last: {}",
                failures, cause
            )));
        }
        None
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for HttpSession {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", &self.config.accept_language)
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Viewport-Width", self.config.viewport.0.to_string())
            .send()
            .await
            .map_err(|e| {
                let cause = if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Transport(e.to_string())
                };
                self.record_failure(&cause).unwrap_or(cause)
            })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let cause = FetchError::Status(status.as_u16());
            return Err(self.record_failure(&cause).unwrap_or(cause));
        }

        let body = response.text().await.map_err(|e| {
            let cause = FetchError::Transport(e.to_string());
            self.record_failure(&cause).unwrap_or(cause)
        })?;

        self.record_success();
        Ok(FetchedDocument::new(body))
    }
}
