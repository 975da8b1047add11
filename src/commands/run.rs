//! Run command implementation: the full sheet-driven batch check.

use crate::config::Config;
use crate::detect::MarketplaceCascade;
use crate::format::Formatter;
use crate::marketplace::Marketplace;
use crate::runner::Orchestrator;
use crate::session::{SessionManager, SessionProvider};
use crate::sheet::{BrandSource, ResultSink, SheetsClient};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Executes a full batch run against the configured spreadsheet.
pub struct RunCommand {
    config: Config,
}

impl RunCommand {
    /// Creates a new run command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the run and returns the formatted summary.
    pub async fn execute(&self) -> Result<String> {
        let sheet_id = self
            .config
            .sheet_id
            .as_deref()
            .context("Missing sheet_id (set it in config.toml or SHEET_ID)")?;
        let token = self
            .config
            .sheets_token
            .as_deref()
            .context("Missing sheets_token (set it in config.toml or SHEETS_TOKEN)")?;

        let sheets = SheetsClient::new(sheet_id, &self.config.sheet_name, token)
            .context("Failed to create spreadsheet client")?;
        let sessions = Arc::new(SessionManager::new(
            self.config.session_config(),
            self.config.proxies.clone(),
        ));

        info!(
            "Starting run against sheet '{}' ({} proxies configured)",
            self.config.sheet_name,
            self.config.proxies.len()
        );
        self.execute_with(&sheets, &sheets, sessions).await
    }

    /// Executes the run with provided source, sink, and session provider
    /// (for testing).
    pub async fn execute_with(
        &self,
        source: &dyn BrandSource,
        sink: &dyn ResultSink,
        sessions: Arc<dyn SessionProvider>,
    ) -> Result<String> {
        let cascades: Vec<MarketplaceCascade> = Marketplace::all()
            .iter()
            .map(|m| MarketplaceCascade::new(*m, self.config.override_table()))
            .collect();

        let orchestrator = Orchestrator::new(
            cascades,
            sessions,
            self.config.max_per_run,
            self.config.batch_per_session,
            self.config.slow_ms,
            self.config.slow_jitter_ms,
        );

        let summary = orchestrator.run(source, sink).await?;
        Ok(Formatter::new(self.config.format).format_summary(&summary))
    }
}
