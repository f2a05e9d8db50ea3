pub mod analytics;
pub mod config;
pub mod crawl;
pub mod error;
pub mod report;
pub mod stopwords;
pub mod store;

pub use analytics::{AnalyticsAggregator, AnalyticsState, LongestPage, PageSummary};
pub use config::CrawlConfig;
pub use crawl::{CrawlContext, CrawlOptions, execute_crawl};
pub use error::{CrawlError, StoreError};
pub use stopwords::StopWords;
pub use store::{AnalyticsStore, LoadOutcome};
