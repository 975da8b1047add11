//! Counted-results text: regex-extract a localized "Found N items" phrase.

use crate::detect::{DetectionContext, Strategy, StrategyOutcome};
use crate::fetch::FetchError;
use crate::marketplace::Marketplace;
use async_trait::async_trait;
use regex_lite::Regex;
use tracing::trace;

/// Reads the marketplace's rendered result counter, when it has one.
/// Counts with thousands spaces ("Найдено 1 234 товара") are handled.
pub struct CountedResultsStrategy {
    marketplace: Marketplace,
    pattern: Option<Regex>,
}

impl CountedResultsStrategy {
    pub fn new(marketplace: Marketplace) -> Self {
        let pattern = marketplace
            .counted_results_pattern()
            .map(|p| Regex::new(p).expect("counted-results pattern must compile"));
        Self { marketplace, pattern }
    }
}

#[async_trait]
impl Strategy for CountedResultsStrategy {
    fn name(&self) -> &'static str {
        "counted-results"
    }

    async fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
    ) -> Result<StrategyOutcome, FetchError> {
        let Some(doc) = ctx.document else { return Ok(StrategyOutcome::Indeterminate) };
        let Some(pattern) = &self.pattern else { return Ok(StrategyOutcome::Indeterminate) };

        let Some(captures) = pattern.captures(doc.lowercased_text()) else {
            return Ok(StrategyOutcome::Indeterminate);
        };

        let digits: String =
            captures.get(1).map(|m| m.as_str()).unwrap_or("").split_whitespace().collect();

        Ok(match digits.parse::<u64>() {
            Ok(0) => StrategyOutcome::absent(),
            Ok(n) => {
                trace!("{} counter reports {} items", self.marketplace, n);
                StrategyOutcome::present()
            }
            Err(_) => StrategyOutcome::Indeterminate,
        })
    }
}
