// Report generation from the scan ledger

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data::Database;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCount {
    pub url: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub pages_scanned: usize,
    pub links_counted: usize,
    pub distinct_links: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub counts: Vec<LinkCount>,
}

/// Tallies every recorded link across the scanned pages. A link that
/// appears twice on one page counts twice; `distinct_links` carries the
/// deduplicated figure. With a `filter`, only links containing the
/// substring are counted at all.
pub fn gather_link_counts(db: &Database, filter: Option<&str>) -> Result<ReportData> {
    let pages = db.scanned_pages()?;
    let pages_scanned = pages.len();

    let mut links_counted = 0usize;
    let mut tally: HashMap<String, usize> = HashMap::new();

    for (_source, links) in pages {
        for link in links {
            if let Some(f) = filter
                && !link.contains(f)
            {
                continue;
            }
            links_counted += 1;
            *tally.entry(link).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<LinkCount> = tally
        .into_iter()
        .map(|(url, count)| LinkCount { url, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.url.cmp(&b.url)));

    Ok(ReportData {
        pages_scanned,
        links_counted,
        distinct_links: counts.len(),
        filter: filter.map(|f| f.to_string()),
        counts,
    })
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                           BACKFILE LINK REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Pages scanned:  {}\n", data.pages_scanned));
    report.push_str(&format!("Links counted:  {}\n", data.links_counted));
    report.push_str(&format!("Distinct links: {}\n", data.distinct_links));
    if let Some(ref filter) = data.filter {
        report.push_str(&format!("Filter:         contains '{}'\n", filter));
    }
    report.push('\n');

    if data.counts.is_empty() {
        report.push_str("  (no links recorded)\n");
    } else {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str("LINK FREQUENCY\n");
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for entry in &data.counts {
            report.push_str(&format!("  {:>6}  {}\n", entry.count, entry.url));
        }
        report.push('\n');
    }

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                               End of Report\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Backfile",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "pages_scanned": data.pages_scanned,
                "links_counted": data.links_counted,
                "distinct_links": data.distinct_links,
                "filter": data.filter
            },
            "links": data.counts
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
