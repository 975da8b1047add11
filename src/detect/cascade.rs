//! Per-marketplace detection cascade: domain axis x strategy axis.

use crate::brand::Brand;
use crate::detect::counted::CountedResultsStrategy;
use crate::detect::fallback::SearchFallbackStrategy;
use crate::detect::markers::DomMarkerStrategy;
use crate::detect::overrides::{OverrideStrategy, OverrideTable};
use crate::detect::structured::StructuredStateStrategy;
use crate::detect::{DetectionContext, Strategy, StrategyOutcome, Verdict};
use crate::fetch::{FetchError, PageFetcher};
use crate::marketplace::Marketplace;
use tracing::{debug, warn};

/// Ordered fallback chain of detection strategies for one marketplace.
///
/// Two failure axes are kept apart: a domain that fails to fetch advances to
/// the next domain; a strategy that returns Indeterminate on a fetched page
/// advances to the next strategy. The cascade returns the first decisive
/// verdict across (domain x strategy), then consults the search-engine
/// fallback; only when everything was indeterminate or failed does it
/// return Unknown.
pub struct MarketplaceCascade {
    marketplace: Marketplace,
    overrides: OverrideStrategy,
    document_strategies: Vec<Box<dyn Strategy>>,
    fallback: SearchFallbackStrategy,
}

impl MarketplaceCascade {
    /// Builds the cascade for one marketplace with the configured override
    /// table.
    pub fn new(marketplace: Marketplace, overrides: OverrideTable) -> Self {
        let document_strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(StructuredStateStrategy::new(marketplace)),
            Box::new(DomMarkerStrategy::new(marketplace)),
            Box::new(CountedResultsStrategy::new(marketplace)),
        ];

        Self {
            marketplace,
            overrides: OverrideStrategy::new(marketplace, overrides),
            document_strategies,
            fallback: SearchFallbackStrategy::new(marketplace),
        }
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    /// Runs the cascade for one brand.
    ///
    /// Always yields a verdict; the only error path is a fatal session loss,
    /// which the orchestrator handles by abandoning the rest of the batch.
    pub async fn run(
        &self,
        brand: &Brand,
        fetcher: &dyn PageFetcher,
    ) -> Result<Verdict, FetchError> {
        // Override lookup short-circuits everything else
        let ctx = DetectionContext::new(brand, None, fetcher);
        if let StrategyOutcome::Decided(verdict) = self.overrides.evaluate(&ctx).await? {
            debug!("{}: {} decided by {}", brand.name(), verdict, self.overrides.name());
            return Ok(verdict);
        }

        for domain in self.marketplace.domains() {
            let url = self.marketplace.search_url(domain, brand.name().trim());
            let doc = match fetcher.fetch(&url).await {
                Ok(doc) => doc,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // Domain failure: move to the next domain, never to Absent
                    warn!("{}: domain {} failed: {}", brand.name(), domain, e);
                    continue;
                }
            };

            let ctx = DetectionContext::new(brand, Some(&doc), fetcher);
            for strategy in &self.document_strategies {
                if let StrategyOutcome::Decided(verdict) = strategy.evaluate(&ctx).await? {
                    debug!(
                        "{}: {} decided by {} on {} after {:?}",
                        brand.name(),
                        verdict,
                        strategy.name(),
                        domain,
                        ctx.started.elapsed()
                    );
                    return Ok(verdict);
                }
            }
        }

        let ctx = DetectionContext::new(brand, None, fetcher);
        match self.fallback.evaluate(&ctx).await? {
            StrategyOutcome::Decided(verdict) => {
                debug!(
                    "{}: {} decided by {} after {:?}",
                    brand.name(),
                    verdict,
                    self.fallback.name(),
                    ctx.started.elapsed()
                );
                Ok(verdict)
            }
            StrategyOutcome::Indeterminate => Ok(Verdict::Unknown),
        }
    }
}
