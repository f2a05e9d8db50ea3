//! Incremental crawl statistics.
//!
//! [`AnalyticsState`] is the durable document: unique pages, the longest page,
//! a word-frequency histogram and per-subdomain page sets. Ordered collections
//! keep the persisted form deterministic. [`AnalyticsAggregator`] owns a state
//! plus its store and persists after every recorded page.

use crate::config::normalize_root_domain;
use crate::error::StoreError;
use crate::stopwords::StopWords;
use crate::store::AnalyticsStore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use strider_scanner::NormalizedUrl;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestPage {
    pub url: String,
    pub word_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsState {
    pub unique_urls: BTreeSet<String>,
    pub longest_page: LongestPage,
    pub word_frequencies: BTreeMap<String, u64>,
    pub subdomains: BTreeMap<String, BTreeSet<String>>,
}

/// What recording one page changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub word_count: u64,
    pub new_page: bool,
    pub new_longest: bool,
}

// `\b` is Unicode-aware: a run touching an accented letter or `_` is not a token.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z0-9]+\b").expect("static token pattern is valid"));

/// Lowercase, then take every run of ASCII letters and digits that sits on
/// word boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `true` when `host` is `root` or one of its subdomains.
pub fn is_under_root(host: &str, root: &str) -> bool {
    if root.is_empty() {
        return false;
    }
    host == root
        || host
            .strip_suffix(root)
            .map(|prefix| prefix.ends_with('.'))
            .unwrap_or(false)
}

impl AnalyticsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page into the state. No persistence.
    pub fn record(&mut self, url: &NormalizedUrl, text: &str, root_domain: &str) -> PageSummary {
        let url_str = url.as_str();
        let new_page = self.unique_urls.insert(url_str.to_string());

        let tokens = tokenize(text);
        let word_count = tokens.len() as u64;

        let new_longest = word_count > self.longest_page.word_count;
        if new_longest {
            self.longest_page = LongestPage {
                url: url_str.to_string(),
                word_count,
            };
        }

        for token in tokens {
            *self.word_frequencies.entry(token).or_insert(0) += 1;
        }

        if let Some(host) = url.host() {
            let host = host.to_ascii_lowercase();
            if is_under_root(&host, root_domain) {
                self.subdomains
                    .entry(host)
                    .or_default()
                    .insert(url_str.to_string());
            }
        }

        PageSummary {
            word_count,
            new_page,
            new_longest,
        }
    }

    pub fn contains_page(&self, url: &NormalizedUrl) -> bool {
        self.unique_urls.contains(url.as_str())
    }

    pub fn unique_page_count(&self) -> usize {
        self.unique_urls.len()
    }

    pub fn longest_page(&self) -> &LongestPage {
        &self.longest_page
    }

    /// Sum of all word counts.
    pub fn total_words(&self) -> u64 {
        self.word_frequencies.values().sum()
    }

    /// The `n` most frequent words not in `stop_words`.
    ///
    /// Sorted by count descending; equal counts are ordered alphabetically.
    pub fn top_words(&self, n: usize, stop_words: &StopWords) -> Vec<(String, u64)> {
        let mut words: Vec<(&String, &u64)> = self
            .word_frequencies
            .iter()
            .filter(|(word, _)| !stop_words.contains(word))
            .collect();

        words.sort_by(|(wa, ca), (wb, cb)| cb.cmp(ca).then_with(|| wa.cmp(wb)));
        words
            .into_iter()
            .take(n)
            .map(|(word, count)| (word.clone(), *count))
            .collect()
    }

    /// `(hostname, page count)` sorted by hostname.
    pub fn subdomain_counts(&self) -> Vec<(String, usize)> {
        self.subdomains
            .iter()
            .map(|(host, urls)| (host.clone(), urls.len()))
            .collect()
    }
}

/// Durable aggregator: every [`add_page`](Self::add_page) is persisted before it returns.
#[derive(Debug)]
pub struct AnalyticsAggregator {
    state: AnalyticsState,
    store: Option<AnalyticsStore>,
    root_domain: String,
}

impl AnalyticsAggregator {
    pub fn new(state: AnalyticsState, store: Option<AnalyticsStore>, root_domain: &str) -> Self {
        Self {
            state,
            store,
            root_domain: normalize_root_domain(root_domain),
        }
    }

    /// Aggregator without a backing store, for tests and dry runs.
    pub fn in_memory(root_domain: &str) -> Self {
        Self::new(AnalyticsState::default(), None, root_domain)
    }

    pub fn add_page(&mut self, url: &NormalizedUrl, text: &str) -> Result<PageSummary, StoreError> {
        let summary = self.state.record(url, text, &self.root_domain);
        debug!(
            "Recorded {} ({} words{})",
            url,
            summary.word_count,
            if summary.new_longest { ", new longest" } else { "" }
        );

        if let Some(ref store) = self.store {
            store.save(&self.state)?;
        }
        Ok(summary)
    }

    /// Write the current state even if nothing changed.
    pub fn flush(&self) -> Result<(), StoreError> {
        if let Some(ref store) = self.store {
            store.save(&self.state)?;
            info!(
                "Flushed analytics for {} pages to {}",
                self.state.unique_page_count(),
                store.path().display()
            );
        }
        Ok(())
    }

    pub fn state(&self) -> &AnalyticsState {
        &self.state
    }

    pub fn into_state(self) -> AnalyticsState {
        self.state
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    pub fn unique_page_count(&self) -> usize {
        self.state.unique_page_count()
    }

    pub fn longest_page(&self) -> &LongestPage {
        self.state.longest_page()
    }

    pub fn top_words(&self, n: usize, stop_words: &StopWords) -> Vec<(String, u64)> {
        self.state.top_words(n, stop_words)
    }

    pub fn subdomain_counts(&self) -> Vec<(String, usize)> {
        self.state.subdomain_counts()
    }
}
