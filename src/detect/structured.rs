//! Structured-state extraction: count results from embedded page state.

use crate::detect::{DetectionContext, Strategy, StrategyOutcome};
use crate::fetch::FetchError;
use crate::marketplace::selectors::{generic, ozon};
use crate::marketplace::Marketplace;
use async_trait::async_trait;
use regex_lite::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

static WB_STATE_MARKER: &str = "window.__PRELOADED_STATE__";

static TRAILING_COMMAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Highest-confidence document strategy: parse the machine-readable state
/// blob the marketplace embeds in its search page and count result items.
pub struct StructuredStateStrategy {
    marketplace: Marketplace,
}

impl StructuredStateStrategy {
    pub fn new(marketplace: Marketplace) -> Self {
        Self { marketplace }
    }

    fn evaluate_wildberries(&self, html_scripts: &[String]) -> StrategyOutcome {
        let Some(script) = html_scripts.iter().find(|s| s.contains(WB_STATE_MARKER)) else {
            return StrategyOutcome::Indeterminate;
        };

        let Some(state) = extract_assigned_json(script, WB_STATE_MARKER) else {
            return StrategyOutcome::Indeterminate;
        };

        match wildberries_product_count(&state) {
            Some(0) => StrategyOutcome::absent(),
            Some(n) => {
                trace!("Preloaded state lists {} products", n);
                StrategyOutcome::present()
            }
            None => StrategyOutcome::Indeterminate,
        }
    }

    fn evaluate_ozon(&self, ctx: &DetectionContext<'_>) -> StrategyOutcome {
        let Some(doc) = ctx.document else { return StrategyOutcome::Indeterminate };
        let Some(raw) = doc.first_text(&ozon::PAGE_STATE) else {
            return StrategyOutcome::Indeterminate;
        };
        let Some(state) = repair_json(&raw) else {
            return StrategyOutcome::Indeterminate;
        };

        let Some(widgets) = state.get("widgetStates").and_then(Value::as_object) else {
            return StrategyOutcome::Indeterminate;
        };

        let mut saw_search_widget = false;
        for (key, value) in widgets {
            if !key.contains("searchResults") {
                continue;
            }
            // Widget payloads are JSON serialized a second time inside the state
            let inner = match value.as_str() {
                Some(s) => repair_json(s),
                None => Some(value.clone()),
            };
            if let Some(items) = inner.as_ref().and_then(|w| w.get("items")).and_then(Value::as_array)
            {
                saw_search_widget = true;
                if !items.is_empty() {
                    trace!("Page state widget {} lists {} items", key, items.len());
                    return StrategyOutcome::present();
                }
            }
        }

        if saw_search_widget {
            StrategyOutcome::absent()
        } else {
            StrategyOutcome::Indeterminate
        }
    }
}

#[async_trait]
impl Strategy for StructuredStateStrategy {
    fn name(&self) -> &'static str {
        "structured-state"
    }

    async fn evaluate(
        &self,
        ctx: &DetectionContext<'_>,
    ) -> Result<StrategyOutcome, FetchError> {
        let Some(doc) = ctx.document else { return Ok(StrategyOutcome::Indeterminate) };

        Ok(match self.marketplace {
            Marketplace::Wildberries => {
                self.evaluate_wildberries(&doc.all_texts(&generic::SCRIPTS))
            }
            Marketplace::Ozon => self.evaluate_ozon(ctx),
            // No known embedded state blob on this marketplace
            Marketplace::YandexMarket => StrategyOutcome::Indeterminate,
        })
    }
}

/// Extracts the JSON assigned to `marker = {...}` inside a script body and
/// parses it defensively.
fn extract_assigned_json(script: &str, marker: &str) -> Option<Value> {
    let start = script.find(marker)?;
    let rest = &script[start + marker.len()..];
    let eq = rest.find('=')?;
    let mut blob = rest[eq + 1..].trim();

    // The assignment usually ends with ";" before the closing script tag
    if let Some(end) = blob.find(";</") {
        blob = &blob[..end];
    }

    repair_json(blob)
}

/// Counts products in the Wildberries preloaded state, trying the known
/// payload shapes in order.
fn wildberries_product_count(state: &Value) -> Option<usize> {
    for path in ["/products/items", "/search/products", "/catalog/products"] {
        if let Some(items) = state.pointer(path).and_then(Value::as_array) {
            return Some(items.len());
        }
    }
    None
}

/// Best-effort JSON parse tolerating trailing semicolons, trailing commas,
/// and truncated documents. Returns `None` when no repair produces valid
/// JSON; callers treat that as an indeterminate channel, never as absence.
pub fn repair_json(raw: &str) -> Option<Value> {
    let cleaned = raw.trim().trim_end_matches(';').trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(v) = serde_json::from_str(cleaned) {
        return Some(v);
    }

    let no_commas = TRAILING_COMMAS.replace_all(cleaned, "${1}").into_owned();
    if let Ok(v) = serde_json::from_str(&no_commas) {
        return Some(v);
    }

    if let Ok(v) = serde_json::from_str(&close_truncated(&no_commas)) {
        return Some(v);
    }

    // Last resort: drop a dangling trailing member, then close again
    let cut = no_commas.rfind(',').map(|i| &no_commas[..i])?;
    let debris = close_truncated(cut);
    match serde_json::from_str(&debris) {
        Ok(v) => {
            debug!("Recovered truncated JSON after dropping trailing member");
            Some(v)
        }
        Err(_) => None,
    }
}

/// Appends the closers a truncated JSON document is missing, terminating an
/// unterminated string first.
fn close_truncated(raw: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = String::with_capacity(raw.len() + stack.len() + 1);
    out.push_str(raw);
    if in_string {
        out.push('"');
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::Brand;
    use crate::fetch::{FetchError, FetchedDocument, PageFetcher};

    struct NoFetch;

    #[async_trait]
    impl PageFetcher for NoFetch {
        async fn fetch(&self, _url: &str) -> Result<FetchedDocument, FetchError> {
            Err(FetchError::Transport("no fetch in this test".into()))
        }
    }

    async fn run(marketplace: Marketplace, html: &str) -> StrategyOutcome {
        let brand = Brand::new("Acme");
        let doc = FetchedDocument::new(html);
        let fetcher = NoFetch;
        let ctx = DetectionContext::new(&brand, Some(&doc), &fetcher);
        StructuredStateStrategy::new(marketplace).evaluate(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_wb_state_with_products_is_present() {
        let html = r#"<script>window.__PRELOADED_STATE__ = {"products":{"items":[{"id":1},{"id":2},{"id":3}]}};</script>"#;
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::present());
    }

    #[tokio::test]
    async fn test_wb_state_empty_is_absent() {
        let html = r#"<script>window.__PRELOADED_STATE__ = {"products":{"items":[]}};</script>"#;
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::absent());
    }

    #[tokio::test]
    async fn test_wb_alternate_payload_shapes() {
        let html = r#"<script>window.__PRELOADED_STATE__ = {"search":{"products":[{"id":1}]}};</script>"#;
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::present());

        let html = r#"<script>window.__PRELOADED_STATE__ = {"catalog":{"products":[]}};</script>"#;
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::absent());
    }

    #[tokio::test]
    async fn test_wb_no_state_is_indeterminate() {
        let html = "<script>var other = 1;</script>";
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_wb_unparseable_state_is_indeterminate() {
        let html = r#"<script>window.__PRELOADED_STATE__ = not json at all</script>"#;
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_wb_unknown_shape_is_indeterminate() {
        // Valid JSON but none of the known product paths
        let html = r#"<script>window.__PRELOADED_STATE__ = {"something":"else"};</script>"#;
        assert_eq!(run(Marketplace::Wildberries, html).await, StrategyOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_ozon_widget_with_items_is_present() {
        let html = r#"<script id="__PAGE_STATE__">{"widgetStates":{"searchResultsV2-123":"{\"items\":[{\"sku\":1}]}"}}</script>"#;
        assert_eq!(run(Marketplace::Ozon, html).await, StrategyOutcome::present());
    }

    #[tokio::test]
    async fn test_ozon_widget_empty_is_absent() {
        let html = r#"<script id="__PAGE_STATE__">{"widgetStates":{"searchResultsV2-123":"{\"items\":[]}"}}</script>"#;
        assert_eq!(run(Marketplace::Ozon, html).await, StrategyOutcome::absent());
    }

    #[tokio::test]
    async fn test_ozon_no_search_widget_is_indeterminate() {
        let html = r#"<script id="__PAGE_STATE__">{"widgetStates":{"header-1":"{}"}}</script>"#;
        assert_eq!(run(Marketplace::Ozon, html).await, StrategyOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_ozon_missing_state_is_indeterminate() {
        assert_eq!(run(Marketplace::Ozon, "<div>no state</div>").await, StrategyOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_ym_never_decides() {
        let html = r#"<script>window.__PRELOADED_STATE__ = {"products":{"items":[{}]}};</script>"#;
        assert_eq!(run(Marketplace::YandexMarket, html).await, StrategyOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_missing_document_is_indeterminate() {
        let brand = Brand::new("Acme");
        let fetcher = NoFetch;
        let ctx = DetectionContext::new(&brand, None, &fetcher);
        let outcome =
            StructuredStateStrategy::new(Marketplace::Wildberries).evaluate(&ctx).await.unwrap();
        assert_eq!(outcome, StrategyOutcome::Indeterminate);
    }

    // JSON repair

    #[test]
    fn test_repair_valid_json() {
        let v = repair_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn test_repair_trailing_semicolon() {
        assert!(repair_json(r#"{"a": 1};"#).is_some());
    }

    #[test]
    fn test_repair_trailing_commas() {
        let v = repair_json(r#"{"a": [1, 2,], "b": {"c": 3,},}"#).unwrap();
        assert_eq!(v["a"].as_array().unwrap().len(), 2);
        assert_eq!(v["b"]["c"], 3);
    }

    #[test]
    fn test_repair_truncated_object() {
        let v = repair_json(r#"{"products": {"items": [{"id": 1}, {"id": 2}"#).unwrap();
        assert_eq!(v["products"]["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_repair_truncated_string() {
        let v = repair_json(r#"{"name": "Acm"#).unwrap();
        assert_eq!(v["name"], "Acm");
    }

    #[test]
    fn test_repair_dangling_member_dropped() {
        let v = repair_json(r#"{"a": 1, "b":"#).unwrap();
        assert_eq!(v["a"], 1);
        assert!(v.get("b").is_none());
    }

    #[test]
    fn test_repair_hopeless_input() {
        assert!(repair_json("").is_none());
        assert!(repair_json("   ").is_none());
        assert!(repair_json("<html>").is_none());
    }

    #[test]
    fn test_close_truncated_respects_strings() {
        // Braces inside strings must not count toward the stack
        assert_eq!(close_truncated(r#"{"a": "{["#), r#"{"a": "{["}"#);
    }
}
