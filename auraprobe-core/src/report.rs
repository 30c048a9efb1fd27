// Summary of a dump run

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpSummary {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub objects_total: usize,
    pub dumped: Vec<ObjectSummary>,
    pub skipped: Vec<String>,
    pub empty: Vec<String>,
    pub failed: Vec<FailedObject>,
    pub files_downloaded: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub name: String,
    pub records: usize,
    pub pages: u32,
    pub truncated: bool,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedObject {
    pub name: String,
    pub reason: String,
}

impl DumpSummary {
    pub fn new(target: String, endpoint: Option<String>) -> Self {
        Self {
            target,
            endpoint,
            started_at: Utc::now(),
            finished_at: None,
            objects_total: 0,
            dumped: Vec::new(),
            skipped: Vec::new(),
            empty: Vec::new(),
            failed: Vec::new(),
            files_downloaded: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total_records(&self) -> usize {
        self.dumped.iter().map(|o| o.records).sum()
    }
}

/// Console rendering of a summary
pub fn render_summary(summary: &DumpSummary) -> String {
    let mut report = String::new();
    report.push_str(&format!("{}\n\n", "━".repeat(60).bright_blue()));
    report.push_str(&format!("{}\n", "# Summary:".bright_white().bold()));
    report.push_str(&format!("  Target: {}\n", summary.target));
    if let Some(ref endpoint) = summary.endpoint {
        report.push_str(&format!("  Endpoint: {}\n", endpoint));
    }
    report.push_str(&format!("  Objects listed: {}\n", summary.objects_total));
    report.push_str(&format!(
        "  Objects dumped: {}\n",
        summary.dumped.len().to_string().green()
    ));
    report.push_str(&format!("  Records saved: {}\n", summary.total_records()));
    report.push_str(&format!("  Objects skipped: {}\n", summary.skipped.len()));
    report.push_str(&format!("  Objects without records: {}\n", summary.empty.len()));
    report.push_str(&format!(
        "  Files downloaded: {}\n",
        summary.files_downloaded.len()
    ));
    if let Some(finished) = summary.finished_at {
        let elapsed = finished - summary.started_at;
        report.push_str(&format!("  Duration: {}s\n", elapsed.num_seconds()));
    }

    if !summary.dumped.is_empty() {
        report.push_str(&format!("\n{}\n", "## Dumped objects".bright_white().bold()));
        for object in &summary.dumped {
            let marker = if object.truncated {
                " (page limit reached)".yellow().to_string()
            } else {
                String::new()
            };
            report.push_str(&format!(
                "  {} {} {} records{}\n",
                "✓".green(),
                object.name,
                object.records.to_string().cyan(),
                marker
            ));
        }
    }

    if !summary.failed.is_empty() {
        report.push_str(&format!("\n{}\n", "## Failures".bright_white().bold()));
        for failure in &summary.failed {
            report.push_str(&format!(
                "  {} {}: {}\n",
                "✗".red(),
                failure.name,
                failure.reason
            ));
        }
    }

    report
}
