// Tests for report generation

use strider_core::analytics::AnalyticsState;
use strider_core::report::{
    ReportFormat, ReportOptions, gather_report_data, generate_json_report, generate_report,
    generate_text_report,
};
use strider_core::stopwords::StopWords;
use strider_scanner::NormalizedUrl;

fn sample_state() -> AnalyticsState {
    let mut state = AnalyticsState::new();
    for (page, text) in [
        ("http://vision.ics.uci.edu/a", "the cat and the dog"),
        ("http://archive.ics.uci.edu/b", "cat cat bird"),
        ("http://example.com/c", "the end"),
    ] {
        state.record(&NormalizedUrl::parse(page).unwrap(), text, "uci.edu");
    }
    state
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("txt"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
    assert!(ReportFormat::from_str("pdf").is_none());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_layout() {
    let stop_words = StopWords::new(["the", "and"]);
    let report = generate_report(&sample_state(), &stop_words, &ReportOptions::default());

    let rule = "=".repeat(60);
    let expected = [
        rule.as_str(),
        "WEB CRAWLER ANALYTICS REPORT",
        rule.as_str(),
        "",
        "1. Number of unique pages: 3",
        "",
        "2. Longest page (by word count):",
        "   URL: http://vision.ics.uci.edu/a",
        "   Word count: 5",
        "",
        "3. 50 most common words:",
        "   1. cat: 3",
        "   2. bird: 1",
        "   3. dog: 1",
        "   4. end: 1",
        "",
        "4. Subdomains in uci.edu domain:",
        "   archive.ics.uci.edu, 1",
        "   vision.ics.uci.edu, 1",
        "",
        rule.as_str(),
    ]
    .join("\n");

    assert_eq!(report, expected);
}

#[test]
fn test_text_report_is_deterministic() {
    let state = sample_state();
    let stop_words = StopWords::default_list();
    let options = ReportOptions::default();

    assert_eq!(
        generate_report(&state, &stop_words, &options),
        generate_report(&state.clone(), &stop_words, &options)
    );
}

#[test]
fn test_text_report_respects_top_n() {
    let options = ReportOptions {
        top_words: 1,
        ..ReportOptions::default()
    };
    let report = generate_report(&sample_state(), &StopWords::default(), &options);

    assert!(report.contains("3. 1 most common words:"));
    assert!(report.contains("   1. cat: 3"));
    assert!(!report.contains("   2. "));
}

#[test]
fn test_text_report_empty_state() {
    let report = generate_report(
        &AnalyticsState::default(),
        &StopWords::default(),
        &ReportOptions::default(),
    );

    assert!(report.contains("1. Number of unique pages: 0"));
    assert!(report.contains("   URL: \n"));
    assert!(report.contains("   Word count: 0"));
}

#[test]
fn test_text_report_custom_root_domain() {
    let options = ReportOptions {
        root_domain: ".ICS.uci.edu".to_string(),
        ..ReportOptions::default()
    };
    let data = gather_report_data(&sample_state(), &StopWords::default(), &options);
    let report = generate_text_report(&data, options.top_words);

    assert!(report.contains("4. Subdomains in ics.uci.edu domain:"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_contents() {
    let stop_words = StopWords::new(["the", "and"]);
    let data = gather_report_data(&sample_state(), &stop_words, &ReportOptions::default());
    let json = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["generator"], "Strider");
    assert_eq!(report["unique_pages"], 3);
    assert_eq!(report["longest_page"]["url"], "http://vision.ics.uci.edu/a");
    assert_eq!(report["longest_page"]["word_count"], 5);
    assert_eq!(report["top_words"][0]["word"], "cat");
    assert_eq!(report["top_words"][0]["count"], 3);
    assert_eq!(report["subdomains"].as_array().unwrap().len(), 2);
    assert_eq!(report["subdomains"][0]["hostname"], "archive.ics.uci.edu");
}
