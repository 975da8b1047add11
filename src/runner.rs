//! Batch orchestrator: sessions, pacing, flushing, partial-failure recovery.

use crate::brand::Brand;
use crate::detect::{MarketplaceCascade, Verdict};
use crate::fetch::PageFetcher;
use crate::marketplace::Marketplace;
use crate::session::SessionProvider;
use crate::sheet::{BrandRow, BrandSource, ResultRecord, ResultSink};
use anyhow::{Context, Result};
use chrono::Utc;
use rand::RngExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tally of one complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub brands_total: usize,
    pub brands_checked: usize,
    pub batches: usize,
    pub present: usize,
    pub absent: usize,
    pub unknown: usize,
    /// Batches cut short by a lost session.
    pub aborted_batches: usize,
}

impl RunSummary {
    fn tally(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Present => self.present += 1,
            Verdict::Absent => self.absent += 1,
            Verdict::Unknown => self.unknown += 1,
        }
    }
}

/// Drives the full run: reads the brand list, walks it in fixed-size batches
/// with one session per batch, runs every marketplace cascade per brand, and
/// flushes each batch's records before the session is released.
///
/// A lost session abandons only the remainder of its batch; the untouched
/// brands are recorded as Unknown so every input row still gets an output
/// row, and the next batch starts with a fresh session.
pub struct Orchestrator {
    cascades: Vec<MarketplaceCascade>,
    sessions: Arc<dyn SessionProvider>,
    max_per_run: usize,
    batch_per_session: usize,
    slow_ms: u64,
    slow_jitter_ms: u64,
}

impl Orchestrator {
    pub fn new(
        cascades: Vec<MarketplaceCascade>,
        sessions: Arc<dyn SessionProvider>,
        max_per_run: usize,
        batch_per_session: usize,
        slow_ms: u64,
        slow_jitter_ms: u64,
    ) -> Self {
        Self {
            cascades,
            sessions,
            max_per_run,
            batch_per_session: batch_per_session.max(1),
            slow_ms,
            slow_jitter_ms,
        }
    }

    pub async fn run(
        &self,
        source: &dyn BrandSource,
        sink: &dyn ResultSink,
    ) -> Result<RunSummary> {
        // Fail before any scraping if the sink cannot be written
        sink.preflight().await.context("Result sink preflight failed")?;

        let mut brands = source.brands().await.context("Failed to read brand list")?;
        let total = brands.len();
        if total > self.max_per_run {
            warn!("Capping run at {} of {} brands", self.max_per_run, total);
            brands.truncate(self.max_per_run);
        }
        info!("Checking {} brands in batches of {}", brands.len(), self.batch_per_session);

        let mut summary = RunSummary { brands_total: brands.len(), ..Default::default() };

        for (batch_index, chunk) in brands.chunks(self.batch_per_session).enumerate() {
            summary.batches += 1;

            let session = self
                .sessions
                .acquire(batch_index)
                .await
                .with_context(|| format!("Failed to acquire session for batch {}", batch_index))?;

            let mut records = Vec::with_capacity(chunk.len());
            let mut session_lost = false;

            for (i, row) in chunk.iter().enumerate() {
                if session_lost {
                    records.push(self.unknown_record(row));
                    continue;
                }

                let (verdicts, lost) = self.check_row(row, session.fetcher()).await;
                info!(
                    "[row {}] {}: {}",
                    row.row_index,
                    row.name,
                    verdicts
                        .iter()
                        .map(|(m, v)| format!("{}={}", m, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                );

                summary.brands_checked += 1;
                for (_, v) in &verdicts {
                    summary.tally(*v);
                }
                records.push(ResultRecord::new(row.row_index, &row.name, verdicts, Utc::now()));

                if lost {
                    warn!(
                        "Session lost in batch {}; remaining {} brands recorded as unknown",
                        batch_index,
                        chunk.len() - i - 1
                    );
                    summary.aborted_batches += 1;
                    session_lost = true;
                } else if i + 1 < chunk.len() {
                    self.pace().await;
                }
            }

            // Flush before releasing the session so a crash between batches
            // never loses finished work
            sink.write_batch(&records)
                .await
                .with_context(|| format!("Failed to flush results for batch {}", batch_index))?;

            drop(session);
        }

        info!(
            "Run complete: {} checked, {} present / {} absent / {} unknown",
            summary.brands_checked, summary.present, summary.absent, summary.unknown
        );
        Ok(summary)
    }

    /// Runs every marketplace cascade for one brand. A fatal fetch error
    /// fills the current and remaining marketplaces with Unknown and reports
    /// the session as lost.
    async fn check_row(
        &self,
        row: &BrandRow,
        fetcher: &dyn PageFetcher,
    ) -> (Vec<(Marketplace, Verdict)>, bool) {
        let brand = Brand::new(&row.name);
        let mut verdicts = Vec::with_capacity(self.cascades.len());

        for (i, cascade) in self.cascades.iter().enumerate() {
            match cascade.run(&brand, fetcher).await {
                Ok(verdict) => verdicts.push((cascade.marketplace(), verdict)),
                Err(e) => {
                    warn!("{} on {}: {}", row.name, cascade.marketplace(), e);
                    for remaining in &self.cascades[i..] {
                        verdicts.push((remaining.marketplace(), Verdict::Unknown));
                    }
                    return (verdicts, true);
                }
            }
            if i + 1 < self.cascades.len() {
                self.pace().await;
            }
        }

        (verdicts, false)
    }

    fn unknown_record(&self, row: &BrandRow) -> ResultRecord {
        let verdicts =
            self.cascades.iter().map(|c| (c.marketplace(), Verdict::Unknown)).collect();
        ResultRecord::new(row.row_index, &row.name, verdicts, Utc::now())
    }

    /// Sleeps the configured base delay plus random jitter.
    async fn pace(&self) {
        if self.slow_ms == 0 && self.slow_jitter_ms == 0 {
            return;
        }
        let jitter = if self.slow_jitter_ms > 0 {
            rand::rng().random_range(0..=self.slow_jitter_ms)
        } else {
            0
        };
        let total = self.slow_ms + jitter;
        debug!("Pacing {}ms", total);
        tokio::time::sleep(Duration::from_millis(total)).await;
    }
}
