//! The presence-detection engine: verdicts, strategies, and cascades.

pub mod cascade;
pub mod counted;
pub mod fallback;
pub mod markers;
pub mod overrides;
pub mod structured;

use crate::brand::Brand;
use crate::fetch::{FetchError, FetchedDocument, PageFetcher};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

pub use cascade::MarketplaceCascade;
pub use overrides::OverrideTable;

/// Final presence verdict for one (brand, marketplace) pair.
///
/// `Unknown` means no strategy on any domain produced a decisive signal. It
/// is distinct from `Absent` and must never be collapsed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Present,
    Absent,
    Unknown,
}

impl Verdict {
    /// Token written to the result sink.
    pub fn token(&self) -> &'static str {
        match self {
            Verdict::Present => "present",
            Verdict::Absent => "absent",
            Verdict::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Outcome of a single strategy.
///
/// `Indeterminate` signals "this data channel gave no decisive answer, try
/// the next strategy" and is explicitly not a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    Decided(Verdict),
    Indeterminate,
}

impl StrategyOutcome {
    pub fn present() -> Self {
        StrategyOutcome::Decided(Verdict::Present)
    }

    pub fn absent() -> Self {
        StrategyOutcome::Decided(Verdict::Absent)
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, StrategyOutcome::Decided(_))
    }
}

/// Transient, per-check bundle handed to each strategy.
///
/// `document` is the fetched search page for the current domain attempt;
/// strategies that do their own fetching (overrides, search fallback) run
/// without one and use `fetcher` instead.
pub struct DetectionContext<'a> {
    pub brand: &'a Brand,
    pub document: Option<&'a FetchedDocument>,
    pub fetcher: &'a dyn PageFetcher,
    pub started: Instant,
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        brand: &'a Brand,
        document: Option<&'a FetchedDocument>,
        fetcher: &'a dyn PageFetcher,
    ) -> Self {
        Self { brand, document, fetcher, started: Instant::now() }
    }
}

/// One detection technique against one data channel.
///
/// Strategies are pure with respect to the context (no shared mutation) but
/// may issue secondary fetches through `ctx.fetcher`. Non-fatal internal
/// errors degrade to `Indeterminate`; a strategy never asserts absence
/// because of a failure. The only `Err` a strategy may return is a fatal
/// session loss from one of its own fetches, which must surface immediately
/// instead of being burned through the remaining requests.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
    ) -> Result<StrategyOutcome, FetchError>;
}
