//! Hard-coded override lookup: known-good URLs for curated brands.

use crate::detect::{DetectionContext, Strategy, StrategyOutcome};
use crate::fetch::FetchError;
use crate::marketplace::{selectors, Marketplace};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Curated mapping from normalized brand key to known-good URLs.
///
/// Loaded once from configuration at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<String, Vec<String>>,
}

impl OverrideTable {
    /// Builds the table, normalizing keys the same way brand keys are
    /// normalized (trim + lowercase).
    pub fn new(raw: HashMap<String, Vec<String>>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        Self { entries }
    }

    pub fn lookup(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Highest-priority strategy: fetch the brand's known-good URLs on this
/// marketplace and look for "has products" signals. A hit short-circuits the
/// rest of the cascade; anything else falls through.
pub struct OverrideStrategy {
    marketplace: Marketplace,
    table: OverrideTable,
}

impl OverrideStrategy {
    pub fn new(marketplace: Marketplace, table: OverrideTable) -> Self {
        Self { marketplace, table }
    }

    fn urls_for_marketplace<'t>(&'t self, key: &str) -> Vec<&'t str> {
        let Some(urls) = self.table.lookup(key) else { return Vec::new() };
        urls.iter()
            .map(String::as_str)
            .filter(|url| {
                self.marketplace
                    .domains()
                    .iter()
                    .any(|d| url.contains(d) || url.contains(d.trim_start_matches("www.")))
            })
            .collect()
    }
}

#[async_trait]
impl Strategy for OverrideStrategy {
    fn name(&self) -> &'static str {
        "override-lookup"
    }

    async fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
    ) -> Result<StrategyOutcome, FetchError> {
        let urls = self.urls_for_marketplace(&ctx.brand.key());
        if urls.is_empty() {
            return Ok(StrategyOutcome::Indeterminate);
        }

        for url in urls {
            let doc = match ctx.fetcher.fetch(url).await {
                Ok(doc) => doc,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Override fetch failed for {}: {}", url, e);
                    continue;
                }
            };

            if doc.matches(selectors::result_cards(self.marketplace))
                || doc.matches(selectors::product_links(self.marketplace))
            {
                debug!("Override URL {} shows product markup", url);
                return Ok(StrategyOutcome::present());
            }

            // Generic seller-page signal: seller and product wording together
            let text = doc.lowercased_text();
            let seller = text.contains("продавец") || text.contains("seller");
            let product = text.contains("товар") || text.contains("product");
            if seller && product {
                debug!("Override URL {} reads like a stocked seller page", url);
                return Ok(StrategyOutcome::present());
            }
        }

        Ok(StrategyOutcome::Indeterminate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::Brand;
    use crate::fetch::{FetchError, FetchedDocument, PageFetcher};
    use std::sync::Mutex;

    struct MappedFetcher {
        pages: HashMap<String, String>,
        lost_session: bool,
        requested: Mutex<Vec<String>>,
    }

    impl MappedFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect(),
                lost_session: false,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn with_lost_session() -> Self {
            Self { pages: HashMap::new(), lost_session: true, requested: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl PageFetcher for MappedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            if self.lost_session {
                return Err(FetchError::SessionLost("circuit open".into()));
            }
            match self.pages.get(url) {
                Some(body) => Ok(FetchedDocument::new(body.clone())),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn table_for(key: &str, urls: &[&str]) -> OverrideTable {
        let mut raw = HashMap::new();
        raw.insert(key.to_string(), urls.iter().map(|s| s.to_string()).collect());
        OverrideTable::new(raw)
    }

    #[test]
    fn test_table_normalizes_keys() {
        let table = table_for("  Acme Corp ", &["https://www.wildberries.ru/brands/acme"]);
        assert!(table.lookup("acme corp").is_some());
        assert!(table.lookup("Acme Corp").is_none());
    }

    #[test]
    fn test_table_drops_empty_entries() {
        let mut raw = HashMap::new();
        raw.insert("acme".to_string(), Vec::new());
        raw.insert("   ".to_string(), vec!["https://x".to_string()]);
        assert!(OverrideTable::new(raw).is_empty());
    }

    #[tokio::test]
    async fn test_card_markup_is_present() {
        let url = "https://www.wildberries.ru/brands/acme";
        let fetcher = MappedFetcher::new(&[(url, r#"<div class="product-card">x</div>"#)]);
        let brand = Brand::new("Acme");
        let ctx = DetectionContext::new(&brand, None, &fetcher);

        let strategy =
            OverrideStrategy::new(Marketplace::Wildberries, table_for("acme", &[url]));
        assert_eq!(strategy.evaluate(&ctx).await.unwrap(), StrategyOutcome::present());
    }

    #[tokio::test]
    async fn test_seller_text_cooccurrence_is_present() {
        let url = "https://www.ozon.ru/seller/acme-123/";
        let fetcher =
            MappedFetcher::new(&[(url, "<body>Продавец Acme. 240 товаров в наличии</body>")]);
        let brand = Brand::new("Acme");
        let ctx = DetectionContext::new(&brand, None, &fetcher);

        let strategy = OverrideStrategy::new(Marketplace::Ozon, table_for("acme", &[url]));
        assert_eq!(strategy.evaluate(&ctx).await.unwrap(), StrategyOutcome::present());
    }

    #[tokio::test]
    async fn test_no_entry_is_indeterminate() {
        let fetcher = MappedFetcher::new(&[]);
        let brand = Brand::new("Unlisted");
        let ctx = DetectionContext::new(&brand, None, &fetcher);

        let strategy = OverrideStrategy::new(
            Marketplace::Wildberries,
            table_for("acme", &["https://www.wildberries.ru/brands/acme"]),
        );
        assert_eq!(strategy.evaluate(&ctx).await.unwrap(), StrategyOutcome::Indeterminate);
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_marketplace_urls_ignored() {
        // Entry exists but only for Ozon; the WB cascade must not fetch it
        let fetcher = MappedFetcher::new(&[]);
        let brand = Brand::new("Acme");
        let ctx = DetectionContext::new(&brand, None, &fetcher);

        let strategy = OverrideStrategy::new(
            Marketplace::Wildberries,
            table_for("acme", &["https://www.ozon.ru/seller/acme-123/"]),
        );
        assert_eq!(strategy.evaluate(&ctx).await.unwrap(), StrategyOutcome::Indeterminate);
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_tries_next_url_then_falls_through() {
        let good = "https://www.wildberries.ru/brands/acme-two";
        let fetcher = MappedFetcher::new(&[(good, "<body>пустая страница</body>")]);
        let brand = Brand::new("Acme");
        let ctx = DetectionContext::new(&brand, None, &fetcher);

        let strategy = OverrideStrategy::new(
            Marketplace::Wildberries,
            table_for("acme", &["https://www.wildberries.ru/brands/acme-one", good]),
        );
        // First URL 404s, second has no product signal: fall through
        assert_eq!(strategy.evaluate(&ctx).await.unwrap(), StrategyOutcome::Indeterminate);
        assert_eq!(fetcher.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_session_loss_propagates_without_trying_next_url() {
        let fetcher = MappedFetcher::with_lost_session();
        let brand = Brand::new("Acme");
        let ctx = DetectionContext::new(&brand, None, &fetcher);

        let strategy = OverrideStrategy::new(
            Marketplace::Wildberries,
            table_for(
                "acme",
                &[
                    "https://www.wildberries.ru/brands/acme-one",
                    "https://www.wildberries.ru/brands/acme-two",
                ],
            ),
        );
        let err = strategy.evaluate(&ctx).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(fetcher.requested.lock().unwrap().len(), 1);
    }
}
