//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::detect::OverrideTable;
use crate::fetch::SessionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Spreadsheet document id
    #[serde(default)]
    pub sheet_id: Option<String>,

    /// Tab name inside the spreadsheet
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// OAuth bearer token for the spreadsheet API
    #[serde(default)]
    pub sheets_token: Option<String>,

    /// Maximum brands processed in one run
    #[serde(default = "default_max_per_run")]
    pub max_per_run: usize,

    /// Brands checked per session before rotation
    #[serde(default = "default_batch_per_session")]
    pub batch_per_session: usize,

    /// Base delay between page requests in milliseconds
    #[serde(default = "default_slow_ms")]
    pub slow_ms: u64,

    /// Random jitter added to the delay (0 to this value)
    #[serde(default = "default_slow_jitter_ms")]
    pub slow_jitter_ms: u64,

    /// Navigation timeout in milliseconds
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Browser user agent presented to marketplaces
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Accept-Language header value
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Session timezone identifier
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Proxy endpoints, rotated round-robin per batch
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Per-brand override URLs, keyed by brand name
    #[serde(default)]
    pub overrides: HashMap<String, Vec<String>>,
}

fn default_sheet_name() -> String {
    "Brands".to_string()
}

fn default_max_per_run() -> usize {
    300
}

fn default_batch_per_session() -> usize {
    60
}

fn default_slow_ms() -> u64 {
    900
}

fn default_slow_jitter_ms() -> u64 {
    400
}

fn default_nav_timeout_ms() -> u64 {
    120_000
}

fn default_accept_language() -> String {
    "ru-RU,ru;q=0.9".to_string()
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_id: None,
            sheet_name: default_sheet_name(),
            sheets_token: None,
            max_per_run: default_max_per_run(),
            batch_per_session: default_batch_per_session(),
            slow_ms: default_slow_ms(),
            slow_jitter_ms: default_slow_jitter_ms(),
            nav_timeout_ms: default_nav_timeout_ms(),
            user_agent: None,
            accept_language: default_accept_language(),
            timezone: default_timezone(),
            proxies: Vec::new(),
            format: OutputFormat::Table,
            overrides: HashMap::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("brandscan").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(id) = std::env::var("SHEET_ID") {
            self.sheet_id = Some(id);
        }

        if let Ok(name) = std::env::var("SHEET_NAME") {
            self.sheet_name = name;
        }

        if let Ok(token) = std::env::var("SHEETS_TOKEN") {
            self.sheets_token = Some(token);
        }

        if let Ok(max) = std::env::var("MAX_PER_RUN") {
            if let Ok(m) = max.parse() {
                self.max_per_run = m;
            }
        }

        if let Ok(batch) = std::env::var("BATCH_PER_SESSION") {
            if let Ok(b) = batch.parse() {
                self.batch_per_session = b;
            }
        }

        if let Ok(slow) = std::env::var("SLOW_MS") {
            if let Ok(s) = slow.parse() {
                self.slow_ms = s;
            }
        }

        if let Ok(jitter) = std::env::var("SLOW_JITTER_MS") {
            if let Ok(j) = jitter.parse() {
                self.slow_jitter_ms = j;
            }
        }

        if let Ok(timeout) = std::env::var("NAV_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.nav_timeout_ms = t;
            }
        }

        if let Ok(ua) = std::env::var("USER_AGENT") {
            self.user_agent = Some(ua);
        }

        if let Ok(lang) = std::env::var("ACCEPT_LANGUAGE") {
            self.accept_language = lang;
        }

        if let Ok(tz) = std::env::var("TIMEZONE") {
            self.timezone = tz;
        }

        if let Ok(proxies) = std::env::var("PROXIES") {
            self.proxies = proxies
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        self
    }

    /// Session fingerprint built from the configured identity fields. The
    /// proxy slot is left empty; the session manager fills it per batch.
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            accept_language: self.accept_language.clone(),
            timezone: self.timezone.clone(),
            nav_timeout_ms: self.nav_timeout_ms,
            ..defaults
        }
    }

    /// Normalized override table from the raw `[overrides]` section.
    pub fn override_table(&self) -> OverrideTable {
        OverrideTable::new(self.overrides.clone())
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.sheet_id.is_none());
        assert_eq!(config.sheet_name, "Brands");
        assert!(config.sheets_token.is_none());
        assert_eq!(config.max_per_run, 300);
        assert_eq!(config.batch_per_session, 60);
        assert_eq!(config.slow_ms, 900);
        assert_eq!(config.slow_jitter_ms, 400);
        assert_eq!(config.nav_timeout_ms, 120_000);
        assert_eq!(config.accept_language, "ru-RU,ru;q=0.9");
        assert_eq!(config.timezone, "Europe/Moscow");
        assert!(config.proxies.is_empty());
        assert_eq!(config.format, OutputFormat::Table);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json, csv"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            sheet_id = "1AbCdEf"
            max_per_run = 50
            slow_ms = 1200
            proxies = ["socks5://a:1080", "socks5://b:1080"]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sheet_id.as_deref(), Some("1AbCdEf"));
        assert_eq!(config.max_per_run, 50);
        assert_eq!(config.slow_ms, 1200);
        assert_eq!(config.proxies.len(), 2);
        // Untouched fields keep their defaults
        assert_eq!(config.sheet_name, "Brands");
        assert_eq!(config.batch_per_session, 60);
    }

    #[test]
    fn test_config_from_toml_with_overrides() {
        let toml = r#"
            sheet_id = "x"

            [overrides]
            "Acme Tools" = ["https://www.ozon.ru/seller/acme-1/"]
            nullco = []
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        let table = config.override_table();
        assert!(table.lookup("  ACME TOOLS ").is_some());
        // Empty URL lists are dropped during normalization
        assert!(table.lookup("nullco").is_none());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            sheet_name = "Q3 Brands"
            batch_per_session = 20
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.sheet_name, "Q3 Brands");
        assert_eq!(config.batch_per_session, 20);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_with_env() {
        let orig_id = std::env::var("SHEET_ID").ok();
        let orig_proxies = std::env::var("PROXIES").ok();
        let orig_max = std::env::var("MAX_PER_RUN").ok();

        std::env::set_var("SHEET_ID", "env-sheet");
        std::env::set_var("PROXIES", "socks5://a:1080, socks5://b:1080 ,");
        std::env::set_var("MAX_PER_RUN", "25");

        let config = Config::new().with_env();
        assert_eq!(config.sheet_id.as_deref(), Some("env-sheet"));
        assert_eq!(config.proxies, vec!["socks5://a:1080", "socks5://b:1080"]);
        assert_eq!(config.max_per_run, 25);

        match orig_id {
            Some(v) => std::env::set_var("SHEET_ID", v),
            None => std::env::remove_var("SHEET_ID"),
        }
        match orig_proxies {
            Some(v) => std::env::set_var("PROXIES", v),
            None => std::env::remove_var("PROXIES"),
        }
        match orig_max {
            Some(v) => std::env::set_var("MAX_PER_RUN", v),
            None => std::env::remove_var("MAX_PER_RUN"),
        }
    }

    #[test]
    fn test_config_with_env_invalid_values() {
        let orig_max = std::env::var("MAX_PER_RUN").ok();

        std::env::set_var("MAX_PER_RUN", "not_a_number");

        let config = Config::new().with_env();
        // Invalid values should be ignored, keeping defaults
        assert_eq!(config.max_per_run, 300);

        match orig_max {
            Some(v) => std::env::set_var("MAX_PER_RUN", v),
            None => std::env::remove_var("MAX_PER_RUN"),
        }
    }

    #[test]
    fn test_session_config_from_config() {
        let config = Config {
            user_agent: Some("TestAgent/1.0".to_string()),
            nav_timeout_ms: 30_000,
            timezone: "Europe/Minsk".to_string(),
            ..Default::default()
        };

        let session = config.session_config();
        assert_eq!(session.user_agent, "TestAgent/1.0");
        assert_eq!(session.nav_timeout_ms, 30_000);
        assert_eq!(session.timezone, "Europe/Minsk");
        assert!(session.proxy.is_none());
    }

    #[test]
    fn test_session_config_default_user_agent() {
        let session = Config::default().session_config();
        assert!(session.user_agent.contains("Chrome"));
    }
}
