use std::fs;
use std::io::Write;
use std::path::PathBuf;
use strider::commands::command_argument_builder;
use strider::handlers::*;
use strider_core::analytics::AnalyticsState;
use strider_core::report::{ReportFormat, ReportOptions};
use strider_core::store::AnalyticsStore;
use strider_core::{CrawlError, StoreError};
use strider_scanner::{CrawlSummary, NormalizedUrl, Rejection, ScopeFilter};
use tempfile::{NamedTempFile, TempDir};
use url::Url;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://www.ics.uci.edu");
    assert_eq!(result, Some("https://www.ics.uci.edu".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("www.ics.uci.edu");
    assert_eq!(result, Some("http://www.ics.uci.edu".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://www.ics.uci.edu")?;
    writeln!(temp_file, "www.cs.uci.edu")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "# seeds for the stats department")?;
    writeln!(temp_file, "https://www.stat.uci.edu")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://www.ics.uci.edu");
    assert_eq!(urls[1], "http://www.cs.uci.edu");
    assert_eq!(urls[2], "https://www.stat.uci.edu");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_urls_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_source_single_url() {
    let url = Url::parse("https://www.ics.uci.edu").unwrap();
    let result = load_urls_from_source(Some(&url), None).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0], "https://www.ics.uci.edu/");
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Either --url or --hosts-file must be provided")
    );
}

#[test]
fn test_install_stop_words() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("strider");

    let path = install_stop_words(&data_dir).unwrap();

    assert_eq!(path, data_dir.join("stop_words.txt"));
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.lines().any(|w| w == "the"));
}

#[test]
fn test_crawl_config_from_matches() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().to_string_lossy().to_string();

    let matches = command_argument_builder()
        .try_get_matches_from([
            "strider",
            "crawl",
            "-u",
            "http://www.ics.uci.edu/",
            "-d",
            data_dir.as_str(),
            "-a",
            ".ics.uci.edu",
            "-a",
            "stat.uci.edu",
            "--root-domain",
            "ics.uci.edu",
            "--trap-policy",
        ])
        .unwrap();
    let (_, crawl) = matches.subcommand().unwrap();

    let config = crawl_config_from_matches(crawl).unwrap();
    assert_eq!(config.allowed_domains, vec![".ics.uci.edu", "stat.uci.edu"]);
    assert_eq!(config.root_domain, "ics.uci.edu");
    assert_eq!(config.data_dir, PathBuf::from(&data_dir));
    assert!(config.trap_policy.is_some());
}

#[test]
fn test_crawl_config_defaults() {
    let matches = command_argument_builder()
        .try_get_matches_from(["strider", "crawl", "-u", "http://www.ics.uci.edu/"])
        .unwrap();
    let (_, crawl) = matches.subcommand().unwrap();

    let config = crawl_config_from_matches(crawl).unwrap();
    assert_eq!(config.allowed_domains.len(), 4);
    assert!(config.trap_policy.is_none());
    assert!(config.data_dir.ends_with(".config/strider"));
}

#[test]
fn test_render_report_from_store() {
    let temp_dir = TempDir::new().unwrap();
    let mut state = AnalyticsState::new();
    state.record(
        &NormalizedUrl::parse("http://a.ics.uci.edu/x").unwrap(),
        "the cat and the dog",
        "uci.edu",
    );
    AnalyticsStore::new(temp_dir.path().join("analytics.json"))
        .save(&state)
        .unwrap();
    fs::write(temp_dir.path().join("stop_words.txt"), "the\nand\n").unwrap();

    let report = render_report(
        temp_dir.path(),
        None,
        &ReportOptions::default(),
        ReportFormat::Text,
    )
    .unwrap();

    assert!(report.contains("1. Number of unique pages: 1"));
    assert!(report.contains("   1. cat: 1"));
    assert!(!report.contains(". the: "));
    assert!(report.contains("   a.ics.uci.edu, 1"));
}

#[test]
fn test_render_report_without_store() {
    let temp_dir = TempDir::new().unwrap();

    let report = render_report(
        temp_dir.path(),
        None,
        &ReportOptions::default(),
        ReportFormat::Json,
    )
    .unwrap();

    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(value["report"]["unique_pages"], 0);
}

#[test]
fn test_render_report_leaves_corrupt_store_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("analytics.json");
    fs::write(&path, "{ truncated").unwrap();

    let report = render_report(
        temp_dir.path(),
        None,
        &ReportOptions::default(),
        ReportFormat::Text,
    )
    .unwrap();

    assert!(report.contains("1. Number of unique pages: 0"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ truncated");
    assert!(!temp_dir.path().join("analytics.json.corrupt").exists());
}

fn flush_failure() -> anyhow::Error {
    StoreError::Io {
        path: PathBuf::from("/data/analytics.json"),
        source: std::io::Error::other("disk full"),
    }
    .into()
}

#[test]
fn test_finish_crawl_success() {
    let summary = CrawlSummary {
        pages_fetched: 3,
        ..Default::default()
    };
    let (summary, state) = finish_crawl(Ok(summary), Ok(AnalyticsState::new())).unwrap();
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(state.unique_page_count(), 0);
}

#[test]
fn test_finish_crawl_reports_flush_failure() {
    let err = finish_crawl(Ok(CrawlSummary::default()), Err(flush_failure())).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.starts_with("Failed to flush analytics"));
    assert!(message.contains("disk full"));
}

#[test]
fn test_finish_crawl_crawl_error_wins_over_flush_failure() {
    let err = finish_crawl(Err(CrawlError::Poisoned("seen-set")), Err(flush_failure()))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CrawlError>(),
        Some(CrawlError::Poisoned("seen-set"))
    ));
    let message = format!("{:#}", err);
    assert!(message.starts_with("Crawl failed"));
    assert!(message.contains("seen-set lock poisoned"));
    assert!(message.contains("disk full"));
}

#[test]
fn test_finish_crawl_reports_crawl_error() {
    let err = finish_crawl(Err(CrawlError::Poisoned("analytics")), Ok(AnalyticsState::new()))
        .unwrap_err();
    assert!(format!("{:#}", err).contains("analytics lock poisoned"));
}

#[test]
fn test_check_scope() {
    let filter = ScopeFilter::default();

    assert!(matches!(
        check_scope(&filter, "http://www.ics.uci.edu/a#b"),
        ScopeVerdict::InScope(ref url) if url.as_str() == "http://www.ics.uci.edu/a"
    ));
    assert!(matches!(
        check_scope(&filter, "https://example.com/"),
        ScopeVerdict::OutOfScope(_, Rejection::Domain)
    ));
    assert!(matches!(
        check_scope(&filter, "ftp://www.ics.uci.edu/"),
        ScopeVerdict::OutOfScope(_, Rejection::Scheme)
    ));
    assert!(matches!(
        check_scope(&filter, "http://www.ics.uci.edu/slides.PPTX"),
        ScopeVerdict::OutOfScope(_, Rejection::Extension)
    ));
    assert!(matches!(
        check_scope(&filter, "not a url"),
        ScopeVerdict::Malformed(_)
    ));
}
