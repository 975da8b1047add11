//! Output formatting for verdicts and run summaries (table, JSON, CSV).

use crate::config::OutputFormat;
use crate::detect::Verdict;
use crate::marketplace::Marketplace;
use crate::runner::RunSummary;
use serde_json::json;

/// Formats check results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the verdicts of a single brand check.
    pub fn format_report(&self, brand: &str, verdicts: &[(Marketplace, Verdict)]) -> String {
        match self.format {
            OutputFormat::Json => self.json_report(brand, verdicts),
            OutputFormat::Table => self.table_report(brand, verdicts),
            OutputFormat::Csv => self.csv_report(brand, verdicts),
        }
    }

    /// Formats the tally of a completed run.
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&json!({
                "brands_total": summary.brands_total,
                "brands_checked": summary.brands_checked,
                "batches": summary.batches,
                "aborted_batches": summary.aborted_batches,
                "present": summary.present,
                "absent": summary.absent,
                "unknown": summary.unknown,
            }))
            .unwrap_or_else(|_| "{}".to_string()),
            OutputFormat::Table | OutputFormat::Csv => {
                let mut lines = Vec::new();
                lines.push(format!(
                    "Checked {} of {} brands in {} batches",
                    summary.brands_checked, summary.brands_total, summary.batches
                ));
                if summary.aborted_batches > 0 {
                    lines.push(format!("Aborted batches: {}", summary.aborted_batches));
                }
                lines.push(format!(
                    "Verdicts: {} present, {} absent, {} unknown",
                    summary.present, summary.absent, summary.unknown
                ));
                lines.join("\n")
            }
        }
    }

    fn json_report(&self, brand: &str, verdicts: &[(Marketplace, Verdict)]) -> String {
        let map: serde_json::Map<String, serde_json::Value> = verdicts
            .iter()
            .map(|(m, v)| (m.to_string(), json!(v.token())))
            .collect();
        serde_json::to_string_pretty(&json!({ "brand": brand, "verdicts": map }))
            .unwrap_or_else(|_| "{}".to_string())
    }

    fn table_report(&self, brand: &str, verdicts: &[(Marketplace, Verdict)]) -> String {
        let name_width = 16;
        let mut lines = Vec::new();

        lines.push(format!("Brand: {}", brand));
        lines.push(String::new());
        lines.push(format!("{:<name_width$}  {}", "Marketplace", "Verdict"));
        lines.push(format!("{:-<name_width$}  {:-<7}", "", ""));
        for (marketplace, verdict) in verdicts {
            lines.push(format!("{:<name_width$}  {}", marketplace.to_string(), verdict));
        }

        lines.join("\n")
    }

    fn csv_report(&self, brand: &str, verdicts: &[(Marketplace, Verdict)]) -> String {
        let mut lines = vec!["brand,marketplace,verdict".to_string()];
        for (marketplace, verdict) in verdicts {
            lines.push(format!("{},{},{}", Self::csv_escape(brand), marketplace, verdict));
        }
        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
