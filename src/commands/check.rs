//! Check command implementation: one brand, every marketplace, no sheet.

use crate::brand::Brand;
use crate::config::Config;
use crate::detect::{MarketplaceCascade, Verdict};
use crate::fetch::PageFetcher;
use crate::format::Formatter;
use crate::marketplace::Marketplace;
use crate::session::{SessionManager, SessionProvider};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Checks a single brand against every marketplace and prints the verdicts.
pub struct CheckCommand {
    config: Config,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the check and returns formatted output.
    pub async fn execute(&self, brand_name: &str) -> Result<String> {
        let sessions =
            SessionManager::new(self.config.session_config(), self.config.proxies.clone());
        let session =
            sessions.acquire(0).await.context("Failed to start rendering session")?;

        self.execute_with_fetcher(session.fetcher(), brand_name).await
    }

    /// Executes the check with a provided fetcher (for testing).
    pub async fn execute_with_fetcher(
        &self,
        fetcher: &dyn PageFetcher,
        brand_name: &str,
    ) -> Result<String> {
        let brand = Brand::new(brand_name);
        info!("Checking brand: {}", brand.name());

        let mut verdicts = Vec::with_capacity(Marketplace::all().len());
        for marketplace in Marketplace::all() {
            let cascade = MarketplaceCascade::new(*marketplace, self.config.override_table());
            let verdict = match cascade.run(&brand, fetcher).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("{} check failed: {}", marketplace, e);
                    Verdict::Unknown
                }
            };
            verdicts.push((*marketplace, verdict));
        }

        Ok(Formatter::new(self.config.format).format_report(brand.name(), &verdicts))
    }
}
