//! brandscan - Batch brand-presence checker for Russian marketplaces
//!
//! Reads brand names from a spreadsheet, checks each one on Wildberries,
//! Ozon, and Yandex Market, and writes the verdicts back.

use anyhow::Result;
use brandscan::commands::{CheckCommand, RunCommand};
use brandscan::config::{Config, OutputFormat};
use brandscan::marketplace::Marketplace;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "brandscan",
    version,
    about = "Batch brand-presence checker for Wildberries, Ozon, and Yandex Market",
    long_about = "Reads brand names from a spreadsheet, decides present/absent/unknown per \
                  marketplace through a cascade of detection strategies, and writes the \
                  verdicts back."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port); replaces the configured pool
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Base delay between requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every brand in the configured sheet and write verdicts back
    #[command(alias = "r")]
    Run,

    /// Check a single brand without touching the sheet
    #[command(alias = "c")]
    Check {
        /// Brand name to check
        brand: String,
    },

    /// List supported marketplaces
    Marketplaces,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.format = cli.format;

    if let Some(proxy) = cli.proxy {
        config.proxies = vec![proxy];
    }
    if let Some(delay) = cli.delay {
        config.slow_ms = delay;
    }

    match cli.command {
        Commands::Run => {
            let cmd = RunCommand::new(config);
            let output = cmd.execute().await?;
            println!("{}", output);
        }

        Commands::Check { brand } => {
            let cmd = CheckCommand::new(config);
            let output = cmd.execute(&brand).await?;
            println!("{}", output);
        }

        Commands::Marketplaces => {
            println!("Supported marketplaces:\n");
            println!("{:<16} {}", "Code", "Domains");
            println!("{:-<16} {:-<40}", "", "");

            for marketplace in Marketplace::all() {
                println!(
                    "{:<16} {}",
                    marketplace.to_string(),
                    marketplace.domains().join(", ")
                );
            }
        }
    }

    Ok(())
}
