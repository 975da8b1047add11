//! Marketplace definitions: domains, search URLs, and textual signals.

pub mod selectors;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The marketplaces checked for brand presence.
///
/// Fixed at process start; each member is bound to one or more candidate
/// domains and a detection cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Wildberries,
    Ozon,
    YandexMarket,
}

impl Marketplace {
    /// Returns all marketplaces in output-column order.
    pub fn all() -> &'static [Marketplace] {
        &[Marketplace::Wildberries, Marketplace::Ozon, Marketplace::YandexMarket]
    }

    /// Candidate domains, tried in declared order.
    pub fn domains(&self) -> &'static [&'static str] {
        match self {
            Marketplace::Wildberries => &["www.wildberries.ru", "www.wildberries.by"],
            Marketplace::Ozon => &["www.ozon.ru"],
            Marketplace::YandexMarket => &["market.yandex.ru"],
        }
    }

    /// Builds the search-results URL for a brand query on one domain.
    pub fn search_url(&self, domain: &str, query: &str) -> String {
        let q = urlencoding::encode(query);
        match self {
            Marketplace::Wildberries => {
                format!("https://{}/catalog/0/search.aspx?search={}", domain, q)
            }
            Marketplace::Ozon => format!("https://{}/search/?text={}", domain, q),
            // lr=213 pins the Moscow region so result counts are stable
            Marketplace::YandexMarket => format!("https://{}/search?text={}&lr=213", domain, q),
        }
    }

    /// Explicit "no results" phrases, matched against lowercased page text.
    pub fn no_results_phrases(&self) -> &'static [&'static str] {
        match self {
            Marketplace::Wildberries => &["ничего не найдено", "ничего не найден"],
            Marketplace::Ozon => &["ничего не найдено"],
            Marketplace::YandexMarket => &["ничего не нашлось"],
        }
    }

    /// Regex for a localized "Found N items" counter, if the marketplace
    /// renders one. Matched against lowercased page text; group 1 is the
    /// count with optional thousands spaces.
    pub fn counted_results_pattern(&self) -> Option<&'static str> {
        match self {
            Marketplace::YandexMarket => Some(r"найдено\s+(\d[\d\s]*)\s+товар"),
            _ => None,
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Marketplace::Wildberries => "wildberries",
            Marketplace::Ozon => "ozon",
            Marketplace::YandexMarket => "yandex-market",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Marketplace {
    type Err = MarketplaceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wildberries" | "wb" => Ok(Marketplace::Wildberries),
            "ozon" | "oz" => Ok(Marketplace::Ozon),
            "yandex-market" | "yandexmarket" | "ym" => Ok(Marketplace::YandexMarket),
            _ => Err(MarketplaceParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketplaceParseError(String);

impl fmt::Display for MarketplaceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown marketplace '{}'. Valid values: wildberries, ozon, yandex-market",
            self.0
        )
    }
}

impl std::error::Error for MarketplaceParseError {}
