//! Page fetching: the abstract rendering backend and its HTTP implementation.

pub mod client;
pub mod document;

use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpSession;
pub use document::FetchedDocument;

/// Errors from a page fetch attempt.
///
/// `SessionLost` is the only variant that escapes a cascade: it means the
/// backend itself is degraded and the remaining brands of the current batch
/// should be abandoned. Everything else is a per-domain failure the cascade
/// recovers from locally.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("navigation timed out")]
    Timeout,

    #[error("request failed with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("session lost: {0}")]
    SessionLost(String),
}

impl FetchError {
    /// True if the error means the whole session is unusable, not just this
    /// one domain attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::SessionLost(_))
    }
}

/// Abstract capability to navigate to a URL and return the delivered page.
///
/// The detection engine only needs this; the concrete backend (TLS-emulating
/// HTTP client, or a mock in tests) is injected.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

/// Browser fingerprint applied to every session.
///
/// Passed opaquely to the backend at session-acquire time; anti-bot concerns
/// stay out of the detection logic.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timezone: String,
    pub viewport: (u32, u32),
    pub proxy: Option<String>,
    pub nav_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "ru-RU,ru;q=0.9".to_string(),
            timezone: "Europe/Moscow".to_string(),
            viewport: (1366, 900),
            proxy: None,
            nav_timeout_ms: 120_000,
        }
    }
}
