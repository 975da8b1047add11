//! Brand source and result sink: the spreadsheet-backed tabular store.

pub mod client;

use crate::detect::Verdict;
use crate::marketplace::Marketplace;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

pub use client::SheetsClient;

/// One input row: the brand name and the sheet row it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRow {
    pub row_index: u32,
    pub name: String,
}

/// The verdicts for one brand across all marketplaces, ready to persist.
///
/// Immutable once built; buffered until a confirmed batched write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub row_index: u32,
    pub brand: String,
    verdicts: Vec<(Marketplace, Verdict)>,
    pub checked_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(
        row_index: u32,
        brand: impl Into<String>,
        verdicts: Vec<(Marketplace, Verdict)>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self { row_index, brand: brand.into(), verdicts, checked_at }
    }

    /// Verdict for a marketplace; a slot that was never filled reads as
    /// Unknown, never as a hole.
    pub fn verdict_for(&self, marketplace: Marketplace) -> Verdict {
        self.verdicts
            .iter()
            .find(|(m, _)| *m == marketplace)
            .map(|(_, v)| *v)
            .unwrap_or(Verdict::Unknown)
    }

    pub fn verdicts(&self) -> &[(Marketplace, Verdict)] {
        &self.verdicts
    }

    /// Sheet cells in column order: one verdict token per marketplace, then
    /// the check timestamp.
    pub fn row_values(&self) -> Vec<String> {
        let mut values: Vec<String> =
            Marketplace::all().iter().map(|m| self.verdict_for(*m).token().to_string()).collect();
        values.push(self.checked_at.to_rfc3339_opts(SecondsFormat::Secs, true));
        values
    }
}

/// Ordered list of brand names to check.
#[async_trait]
pub trait BrandSource: Send + Sync {
    async fn brands(&self) -> Result<Vec<BrandRow>>;
}

/// Destination for verdict records.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Minimal can-write check, run before any brand is processed. Failure
    /// here is fatal to the run.
    async fn preflight(&self) -> Result<()>;

    /// Persists all records collected since the last flush as one batched
    /// write.
    async fn write_batch(&self, records: &[ResultRecord]) -> Result<()>;
}
