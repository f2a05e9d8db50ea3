//! Crawl trap defenses.
//!
//! [`TrapDetector`] is the seen-set: it only rejects exact URLs that were already
//! handed out. It does not notice parametrized infinite spaces such as calendars
//! with incrementing query strings. [`TrapPolicy`] is an optional, independent
//! layer for those structural patterns:
//! - Excessive path depth (e.g., /a/b/c/d/e/f/g/h)
//! - Repetitive path patterns (e.g., /a/b/a/b/a/b)
//! - Extremely long URLs
//! - Calendar traps (three or more consecutive numeric segments)
//! - Query strings with too many parameters

use crate::normalize::NormalizedUrl;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Exactly-once gate over normalized URLs.
#[derive(Debug, Default)]
pub struct TrapDetector {
    seen: HashSet<String>,
}

impl TrapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url` and return `true` only if it was not seen before.
    pub fn mark_and_check(&mut self, url: &NormalizedUrl) -> bool {
        self.seen.insert(url.as_str().to_string())
    }

    /// Register a URL without caring whether it was new.
    pub fn mark_seen(&mut self, url: &NormalizedUrl) {
        self.seen.insert(url.as_str().to_string());
    }

    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.seen.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Structural trap heuristics, applied after scope and before the seen-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapPolicy {
    /// Maximum URL path depth (number of segments)
    pub max_path_depth: usize,
    /// Maximum URL length in characters
    pub max_url_length: usize,
    /// Maximum number of repeated path segments
    pub max_repeated_segments: usize,
    /// Maximum number of query parameters
    pub max_query_params: usize,
}

impl Default for TrapPolicy {
    fn default() -> Self {
        Self {
            max_path_depth: 15,
            max_url_length: 2048,
            max_repeated_segments: 3,
            max_query_params: 8,
        }
    }
}

impl TrapPolicy {
    /// Name of the first heuristic that flags `url`, if any.
    pub fn violation(&self, url: &NormalizedUrl) -> Option<&'static str> {
        if url.as_str().len() > self.max_url_length {
            return Some("url-length");
        }

        let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

        if segments.len() > self.max_path_depth {
            return Some("path-depth");
        }

        if has_repetitive_pattern(&segments, self.max_repeated_segments) {
            return Some("repeated-segments");
        }

        if is_calendar_trap(&segments) {
            return Some("calendar");
        }

        let params = url.as_url().query_pairs().count();
        if params > self.max_query_params {
            return Some("query-params");
        }

        None
    }

    pub fn is_trap(&self, url: &NormalizedUrl) -> bool {
        self.violation(url).is_some()
    }
}

fn has_repetitive_pattern(segments: &[&str], max_repeats: usize) -> bool {
    if segments.len() < 4 {
        return false;
    }

    for window_size in 1..=segments.len() / 2 {
        let mut repeat_count = 0;
        for i in 0..segments.len().saturating_sub(window_size) {
            if segments[i] == segments[i + window_size] {
                repeat_count += 1;
                if repeat_count >= max_repeats {
                    return true;
                }
            }
        }
    }

    false
}

fn is_calendar_trap(segments: &[&str]) -> bool {
    let mut consecutive_numbers = 0;
    for segment in segments {
        if segment.parse::<u32>().is_ok() {
            consecutive_numbers += 1;
            if consecutive_numbers >= 3 {
                return true;
            }
        } else {
            consecutive_numbers = 0;
        }
    }
    false
}
