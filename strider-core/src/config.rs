use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strider_scanner::scope::DEFAULT_ALLOWED_DOMAINS;
use strider_scanner::{ScopeFilter, TrapPolicy};

pub const ANALYTICS_FILE: &str = "analytics.json";
pub const STOP_WORDS_FILE: &str = "stop_words.txt";
pub const DEFAULT_ROOT_DOMAIN: &str = "uci.edu";

/// Everything a [`CrawlContext`](crate::crawl::CrawlContext) needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Allowed host suffixes, e.g. `.ics.uci.edu`.
    pub allowed_domains: Vec<String>,
    /// Hosts equal to or under this domain get per-subdomain page sets.
    pub root_domain: String,
    /// Directory holding the analytics store and stop-word list.
    pub data_dir: PathBuf,
    /// Structural trap heuristics. `None` leaves only the exact-URL check.
    pub trap_policy: Option<TrapPolicy>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            root_domain: DEFAULT_ROOT_DOMAIN.to_string(),
            data_dir: PathBuf::from("."),
            trap_policy: None,
        }
    }
}

impl CrawlConfig {
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_root_domain(mut self, root_domain: impl Into<String>) -> Self {
        self.root_domain = root_domain.into();
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_trap_policy(mut self, policy: Option<TrapPolicy>) -> Self {
        self.trap_policy = policy;
        self
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(ANALYTICS_FILE)
    }

    pub fn stop_words_path(&self) -> PathBuf {
        self.data_dir.join(STOP_WORDS_FILE)
    }

    pub fn scope_filter(&self) -> ScopeFilter {
        ScopeFilter::new(&self.allowed_domains)
    }

    /// Root domain lowercased, without a leading dot.
    pub fn normalized_root_domain(&self) -> String {
        normalize_root_domain(&self.root_domain)
    }
}

pub fn normalize_root_domain(root: &str) -> String {
    root.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.allowed_domains.len(), 4);
        assert_eq!(config.root_domain, "uci.edu");
        assert_eq!(config.store_path(), PathBuf::from("./analytics.json"));
        assert!(config.trap_policy.is_none());
    }

    #[test]
    fn test_root_domain_normalized() {
        let config = CrawlConfig::default().with_root_domain(".UCI.edu ");
        assert_eq!(config.normalized_root_domain(), "uci.edu");
    }
}
