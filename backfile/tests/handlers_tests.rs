use backfile::handlers::*;
use backfile_core::seeds::DateStyle;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_parse_seed_line_with_scheme() {
    let result = parse_seed_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_seed_line_without_scheme() {
    let result = parse_seed_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_seed_line_invalid() {
    let result = parse_seed_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_seeds_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com/archive/20160402")?;
    writeln!(temp_file, "example.com/archive/20160401")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "https://example.com/archive/20160331")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_seeds_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com/archive/20160402");
    assert_eq!(urls[1], "http://example.com/archive/20160401");
    assert_eq!(urls[2], "https://example.com/archive/20160331");

    Ok(())
}

#[test]
fn test_load_seeds_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_seeds_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid urls"));
}

#[test]
fn test_load_seeds_from_file_missing() {
    let path = PathBuf::from("/nonexistent/seeds.txt");
    let result = load_seeds_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Failed to read seeds file"));
}

#[test]
fn test_load_seeds_from_source_schema() {
    let schema = "http://example.com/archive/{}/all".to_string();
    let until = "2016-04-01".to_string();

    let urls = load_seeds_from_source(
        Some(&schema),
        "2016-04-02",
        Some(&until),
        DateStyle::Compact,
        None,
    )
    .unwrap();

    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0], "http://example.com/archive/20160402/all");
    assert_eq!(urls[1], "http://example.com/archive/20160401/all");
}

#[test]
fn test_load_seeds_from_source_no_input() {
    let result = load_seeds_from_source(None, "today", None, DateStyle::Compact, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .contains("Either --schema or --seeds-file must be provided")
    );
}

#[test]
fn test_load_seeds_from_source_schema_without_until() {
    let schema = "http://example.com/archive/{}/all".to_string();
    let result = load_seeds_from_source(Some(&schema), "today", None, DateStyle::Compact, None);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("--until"));
}

#[test]
fn test_load_seeds_from_source_bad_date_is_an_error() {
    let schema = "http://example.com/archive/{}/all".to_string();
    let until = "2016-4-1".to_string();

    let result = load_seeds_from_source(
        Some(&schema),
        "2016-04-02",
        Some(&until),
        DateStyle::Compact,
        None,
    );
    assert!(result.is_err());
}
