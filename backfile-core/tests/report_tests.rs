// Tests for report generation

use backfile_core::data::Database;
use backfile_core::report::{
    gather_link_counts, generate_json_report, generate_text_report, ReportFormat,
};
use tempfile::TempDir;

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).unwrap();
    (temp_dir, db)
}

fn ledger_with_links() -> (TempDir, Database) {
    let (temp_dir, db) = create_test_db();

    db.record_links(
        "http://example.com/archive/20160402",
        &[
            "/reviews/popcorn".to_string(),
            "/reviews/popcorn".to_string(),
            "/reviews/toaster".to_string(),
            "/about".to_string(),
        ],
    )
    .unwrap();
    db.record_links(
        "http://example.com/archive/20160401",
        &["/reviews/popcorn".to_string(), "/reviews/kettle".to_string()],
    )
    .unwrap();

    (temp_dir, db)
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("json"), Some(ReportFormat::Json)));
}

#[test]
fn test_report_format_case_insensitive() {
    assert!(matches!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
}

#[test]
fn test_report_format_invalid() {
    assert!(ReportFormat::from_str("xml").is_none());
    assert!(ReportFormat::from_str("").is_none());
}

// ============================================================================
// Link Count Tests
// ============================================================================

#[test]
fn test_gather_counts_and_ordering() {
    let (_temp_dir, db) = ledger_with_links();

    let data = gather_link_counts(&db, None).unwrap();

    assert_eq!(data.pages_scanned, 2);
    assert_eq!(data.links_counted, 6);
    assert_eq!(data.distinct_links, 4);
    assert!(data.filter.is_none());

    // Most frequent first, ties broken by url
    assert_eq!(data.counts[0].url, "/reviews/popcorn");
    assert_eq!(data.counts[0].count, 3);
    assert_eq!(data.counts[1].url, "/about");
    assert_eq!(data.counts[1].count, 1);
    assert_eq!(data.counts[2].url, "/reviews/kettle");
    assert_eq!(data.counts[3].url, "/reviews/toaster");
}

#[test]
fn test_gather_with_filter() {
    let (_temp_dir, db) = ledger_with_links();

    let data = gather_link_counts(&db, Some("/reviews/")).unwrap();

    assert_eq!(data.pages_scanned, 2);
    assert_eq!(data.links_counted, 5);
    assert_eq!(data.distinct_links, 3);
    assert_eq!(data.filter.as_deref(), Some("/reviews/"));
    assert!(data.counts.iter().all(|c| c.url.contains("/reviews/")));
}

#[test]
fn test_gather_empty_ledger() {
    let (_temp_dir, db) = create_test_db();

    let data = gather_link_counts(&db, None).unwrap();

    assert_eq!(data.pages_scanned, 0);
    assert_eq!(data.links_counted, 0);
    assert_eq!(data.distinct_links, 0);
    assert!(data.counts.is_empty());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_contains_counts() {
    let (_temp_dir, db) = ledger_with_links();

    let data = gather_link_counts(&db, None).unwrap();
    let report = generate_text_report(&data);

    assert!(report.contains("BACKFILE LINK REPORT"));
    assert!(report.contains("Pages scanned:  2"));
    assert!(report.contains("Links counted:  6"));
    assert!(report.contains("Distinct links: 4"));
    assert!(report.contains("     3  /reviews/popcorn"));
    assert!(report.contains("End of Report"));
}

#[test]
fn test_text_report_shows_filter() {
    let (_temp_dir, db) = ledger_with_links();

    let data = gather_link_counts(&db, Some("popcorn")).unwrap();
    let report = generate_text_report(&data);

    assert!(report.contains("Filter:         contains 'popcorn'"));
}

#[test]
fn test_text_report_empty_ledger() {
    let (_temp_dir, db) = create_test_db();

    let data = gather_link_counts(&db, None).unwrap();
    let report = generate_text_report(&data);

    assert!(report.contains("(no links recorded)"));
    assert!(!report.contains("LINK FREQUENCY"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_shape() {
    let (_temp_dir, db) = ledger_with_links();

    let data = gather_link_counts(&db, None).unwrap();
    let json_str = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json_str).unwrap();

    assert_eq!(value["report"]["metadata"]["generator"], "Backfile");
    assert_eq!(value["report"]["metadata"]["format"], "json");
    assert_eq!(value["report"]["summary"]["pages_scanned"], 2);
    assert_eq!(value["report"]["summary"]["links_counted"], 6);
    assert_eq!(value["report"]["summary"]["distinct_links"], 4);

    let links = value["report"]["links"].as_array().unwrap();
    assert_eq!(links.len(), 4);
    assert_eq!(links[0]["url"], "/reviews/popcorn");
    assert_eq!(links[0]["count"], 3);
}

#[test]
fn test_json_report_null_filter_serializes() {
    let (_temp_dir, db) = create_test_db();

    let data = gather_link_counts(&db, None).unwrap();
    let json_str = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json_str).unwrap();

    assert!(value["report"]["summary"]["filter"].is_null());
}
