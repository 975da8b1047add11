//! DOM marker presence: result cards and explicit "no results" text.

use crate::detect::{DetectionContext, Strategy, StrategyOutcome};
use crate::fetch::FetchError;
use crate::marketplace::{selectors, Marketplace};
use async_trait::async_trait;
use tracing::trace;

/// Looks for known result-card markers, falling back to the marketplace's
/// explicit "no results" phrase. A page with neither signal is indeterminate
/// rather than absent.
pub struct DomMarkerStrategy {
    marketplace: Marketplace,
}

impl DomMarkerStrategy {
    pub fn new(marketplace: Marketplace) -> Self {
        Self { marketplace }
    }
}

#[async_trait]
impl Strategy for DomMarkerStrategy {
    fn name(&self) -> &'static str {
        "dom-markers"
    }

    async fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
    ) -> Result<StrategyOutcome, FetchError> {
        let Some(doc) = ctx.document else { return Ok(StrategyOutcome::Indeterminate) };

        let cards = doc.count(selectors::result_cards(self.marketplace));
        if cards > 0 {
            trace!("{} result cards in DOM", cards);
            return Ok(StrategyOutcome::present());
        }

        let text = doc.lowercased_text();
        if self.marketplace.no_results_phrases().iter().any(|p| text.contains(p)) {
            return Ok(StrategyOutcome::absent());
        }

        // A rendered result zone with zero cards usually means lazy-loaded
        // content the backend did not deliver; not decisive either way.
        if let Some(zone) = selectors::result_zone(self.marketplace) {
            if doc.matches(zone) {
                trace!("Result zone present but empty");
            }
        }

        Ok(StrategyOutcome::Indeterminate)
    }
}
