//! External search-engine fallback: last-resort presence check.
//!
//! Queries general web search engines with `site:` restriction and several
//! brand-name variants. "No hit anywhere" is treated as Absent, the weakest
//! negative signal in the cascade.

use crate::detect::{DetectionContext, Strategy, StrategyOutcome};
use crate::fetch::FetchError;
use crate::marketplace::Marketplace;
use async_trait::async_trait;
use scraper::Selector;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// DuckDuckGo HTML-only result links.
static DDG_RESULTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a, .result__title a").unwrap());

/// Bing organic result links.
static BING_RESULTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.b_algo h2 a, .b_algo a").unwrap());

/// Supported general-purpose search engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    DuckDuckGo,
    Bing,
}

impl SearchEngine {
    pub fn all() -> &'static [SearchEngine] {
        &[SearchEngine::DuckDuckGo, SearchEngine::Bing]
    }

    /// Builds the query URL for a raw query string.
    pub fn query_url(&self, query: &str) -> String {
        let q = urlencoding::encode(query);
        match self {
            SearchEngine::DuckDuckGo => format!("https://html.duckduckgo.com/html/?q={}", q),
            SearchEngine::Bing => format!("https://www.bing.com/search?q={}", q),
        }
    }

    /// Selector for organic result links on this engine's result page.
    fn result_links(&self) -> &'static Selector {
        match self {
            SearchEngine::DuckDuckGo => &DDG_RESULTS,
            SearchEngine::Bing => &BING_RESULTS,
        }
    }
}

/// Search-engine fallback strategy.
///
/// A result link into the marketplace domain decides Present. Exhausting
/// every variant on every engine with all fetches succeeding and no hit
/// decides Absent. A transient engine fetch failure without a hit leaves
/// the channel indeterminate; a fatal session loss aborts the whole scan
/// immediately.
pub struct SearchFallbackStrategy {
    marketplace: Marketplace,
    engines: Vec<SearchEngine>,
}

impl SearchFallbackStrategy {
    pub fn new(marketplace: Marketplace) -> Self {
        Self { marketplace, engines: SearchEngine::all().to_vec() }
    }

    #[cfg(test)]
    fn with_engines(marketplace: Marketplace, engines: Vec<SearchEngine>) -> Self {
        Self { marketplace, engines }
    }

    /// True if any organic result link points into the marketplace domain.
    /// Redirect-style hrefs keep the target domain percent-encoded but with
    /// dots intact, so a substring check covers both direct and redirect
    /// links.
    fn has_domain_hit(&self, links: &[String], domain: &str) -> bool {
        let bare = domain.trim_start_matches("www.");
        links.iter().any(|href| href.contains(bare))
    }
}

#[async_trait]
impl Strategy for SearchFallbackStrategy {
    fn name(&self) -> &'static str {
        "search-fallback"
    }

    async fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
    ) -> Result<StrategyOutcome, FetchError> {
        let mut had_failure = false;

        for variant in ctx.brand.variants() {
            for engine in &self.engines {
                for domain in self.marketplace.domains() {
                    let url = engine.query_url(&format!("site:{} {}", domain, variant));
                    let doc = match ctx.fetcher.fetch(&url).await {
                        Ok(doc) => doc,
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            warn!("Search fallback fetch failed ({:?}): {}", engine, e);
                            had_failure = true;
                            continue;
                        }
                    };

                    let links = doc.attr_values(engine.result_links(), "href");
                    if self.has_domain_hit(&links, domain) {
                        debug!(
                            "Search hit for '{}' on {} via {:?}",
                            variant, domain, engine
                        );
                        return Ok(StrategyOutcome::present());
                    }
                }
            }
        }

        if had_failure {
            Ok(StrategyOutcome::Indeterminate)
        } else {
            // Weak negative: every variant on every engine came back clean
            Ok(StrategyOutcome::absent())
        }
    }
}
