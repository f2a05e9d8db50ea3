// Report generation from analytics state

use crate::analytics::AnalyticsState;
use crate::config::{DEFAULT_ROOT_DOMAIN, normalize_root_domain};
use crate::stopwords::StopWords;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_WORDS: usize = 50;

const RULE: &str = "============================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub root_domain: String,
    pub top_words: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            root_domain: DEFAULT_ROOT_DOMAIN.to_string(),
            top_words: DEFAULT_TOP_WORDS,
        }
    }
}

/// The four report sections, computed once and rendered by each format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    pub unique_pages: usize,
    pub longest_page_url: String,
    pub longest_page_word_count: u64,
    pub top_words: Vec<WordCount>,
    pub root_domain: String,
    pub subdomains: Vec<SubdomainCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainCount {
    pub hostname: String,
    pub pages: usize,
}

pub fn gather_report_data(
    state: &AnalyticsState,
    stop_words: &StopWords,
    options: &ReportOptions,
) -> ReportData {
    let longest = state.longest_page();
    ReportData {
        unique_pages: state.unique_page_count(),
        longest_page_url: longest.url.clone(),
        longest_page_word_count: longest.word_count,
        top_words: state
            .top_words(options.top_words, stop_words)
            .into_iter()
            .map(|(word, count)| WordCount { word, count })
            .collect(),
        root_domain: normalize_root_domain(&options.root_domain),
        subdomains: state
            .subdomain_counts()
            .into_iter()
            .map(|(hostname, pages)| SubdomainCount { hostname, pages })
            .collect(),
    }
}

/// Plain-text report. Deterministic for a given state and stop-word list.
pub fn generate_report(
    state: &AnalyticsState,
    stop_words: &StopWords,
    options: &ReportOptions,
) -> String {
    generate_text_report(&gather_report_data(state, stop_words, options), options.top_words)
}

pub fn generate_text_report(data: &ReportData, top_n: usize) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(RULE.to_string());
    lines.push("WEB CRAWLER ANALYTICS REPORT".to_string());
    lines.push(RULE.to_string());
    lines.push(String::new());

    lines.push(format!("1. Number of unique pages: {}", data.unique_pages));
    lines.push(String::new());

    lines.push("2. Longest page (by word count):".to_string());
    lines.push(format!("   URL: {}", data.longest_page_url));
    lines.push(format!("   Word count: {}", data.longest_page_word_count));
    lines.push(String::new());

    lines.push(format!("3. {} most common words:", top_n));
    for (idx, entry) in data.top_words.iter().enumerate() {
        lines.push(format!("   {}. {}: {}", idx + 1, entry.word, entry.count));
    }
    lines.push(String::new());

    lines.push(format!("4. Subdomains in {} domain:", data.root_domain));
    for entry in &data.subdomains {
        lines.push(format!("   {}, {}", entry.hostname, entry.pages));
    }
    lines.push(String::new());

    lines.push(RULE.to_string());

    lines.join("\n")
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "generator": "Strider",
            "version": env!("CARGO_PKG_VERSION"),
            "unique_pages": data.unique_pages,
            "longest_page": {
                "url": data.longest_page_url,
                "word_count": data.longest_page_word_count,
            },
            "top_words": data.top_words,
            "root_domain": data.root_domain,
            "subdomains": data.subdomains,
        }
    });
    serde_json::to_string_pretty(&json_report)
}
