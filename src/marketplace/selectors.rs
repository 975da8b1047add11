//! CSS selectors for marketplace search pages.
//!
//! All selectors used by the detection strategies live here. Update this
//! file when a marketplace changes its markup.
//!
//! **Update process**: when a cascade starts returning Unknown for brands
//! known to be present, capture an HTML sample, update selectors, and add a
//! test fixture.

use crate::marketplace::Marketplace;
use scraper::Selector;
use std::sync::LazyLock;

/// Wildberries search page.
pub mod wb {
    use super::*;

    /// Product result cards.
    pub static CARDS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".product-card, \
             .product-card__wrapper, \
             [data-card-index]",
        )
        .unwrap()
    });

    /// Links into the product catalog (override-page signal).
    pub static PRODUCT_LINKS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href*='/catalog/']").unwrap());
}

/// Ozon search page.
pub mod ozon {
    use super::*;

    /// Search results containers.
    pub static RESULT_ZONE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[data-widget='searchResultsV2'], \
             [data-widget='searchResults']",
        )
        .unwrap()
    });

    /// Result links inside the containers; an empty zone renders no anchors.
    pub static RESULT_LINKS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[data-widget='searchResultsV2'] a, \
             [data-widget='searchResults'] a",
        )
        .unwrap()
    });

    /// Embedded page state blob.
    pub static PAGE_STATE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("script#__PAGE_STATE__, #__PAGE_STATE__").unwrap());

    /// Links into product pages (override-page signal).
    pub static PRODUCT_LINKS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href*='/product/']").unwrap());
}

/// Yandex Market search page.
pub mod ym {
    use super::*;

    /// Search results zone.
    pub static RESULT_ZONE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-zone-name='SearchResults']").unwrap());

    /// Product snippets inside the zone.
    pub static SNIPPETS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[data-zone-name='SearchResults'] [data-autotest-id='product-snippet'], \
             [data-auto='snippet-cell']",
        )
        .unwrap()
    });

    /// Links into product pages (override-page signal).
    pub static PRODUCT_LINKS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href*='/product--'], a[href*='/card/']").unwrap());
}

/// Generic selectors shared across strategies.
pub mod generic {
    use super::*;

    /// All script tags, for embedded-state extraction.
    pub static SCRIPTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());
}

/// Result-card selectors for a marketplace (DOM marker strategy).
pub fn result_cards(marketplace: Marketplace) -> &'static Selector {
    match marketplace {
        Marketplace::Wildberries => &wb::CARDS,
        Marketplace::Ozon => &ozon::RESULT_LINKS,
        Marketplace::YandexMarket => &ym::SNIPPETS,
    }
}

/// Result-zone selectors: presence of the zone without cards is not decisive
/// on its own, but an Ozon/YM zone with zero links is a structural hint.
pub fn result_zone(marketplace: Marketplace) -> Option<&'static Selector> {
    match marketplace {
        Marketplace::Wildberries => None,
        Marketplace::Ozon => Some(&ozon::RESULT_ZONE),
        Marketplace::YandexMarket => Some(&ym::RESULT_ZONE),
    }
}

/// Product-link selectors for override pages.
pub fn product_links(marketplace: Marketplace) -> &'static Selector {
    match marketplace {
        Marketplace::Wildberries => &wb::PRODUCT_LINKS,
        Marketplace::Ozon => &ozon::PRODUCT_LINKS,
        Marketplace::YandexMarket => &ym::PRODUCT_LINKS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let _ = &*wb::CARDS;
        let _ = &*wb::PRODUCT_LINKS;
        let _ = &*ozon::RESULT_ZONE;
        let _ = &*ozon::RESULT_LINKS;
        let _ = &*ozon::PAGE_STATE;
        let _ = &*ym::RESULT_ZONE;
        let _ = &*ym::SNIPPETS;
        let _ = &*generic::SCRIPTS;
    }

    #[test]
    fn test_wb_card_matching() {
        let html = Html::parse_document(
            r#"<div class="product-card__wrapper"><a href="/catalog/123/detail.aspx">x</a></div>"#,
        );
        assert!(html.select(&wb::CARDS).next().is_some());
    }

    #[test]
    fn test_ozon_zone_and_links() {
        let html = Html::parse_document(
            r#"<div data-widget="searchResultsV2"><a href="/product/abc-123">x</a></div>"#,
        );
        assert!(html.select(&ozon::RESULT_ZONE).next().is_some());
        assert_eq!(html.select(&ozon::RESULT_LINKS).count(), 1);
    }

    #[test]
    fn test_ym_snippets() {
        let html = Html::parse_document(
            r#"<div data-zone-name="SearchResults">
                <article data-autotest-id="product-snippet">x</article>
            </div>"#,
        );
        assert!(html.select(&ym::RESULT_ZONE).next().is_some());
        assert_eq!(html.select(&ym::SNIPPETS).count(), 1);
    }

    #[test]
    fn test_per_marketplace_lookup() {
        for m in Marketplace::all() {
            let _ = result_cards(*m);
            let _ = product_links(*m);
        }
        assert!(result_zone(Marketplace::Wildberries).is_none());
        assert!(result_zone(Marketplace::Ozon).is_some());
    }
}
