pub mod crawler;
pub mod error;
pub mod html;
pub mod normalize;
pub mod page;
pub mod scope;
pub mod trap;

pub use crawler::{CrawlSummary, Crawler, HandlerError, PageCallback, ProgressCallback};
pub use error::ScanError;
pub use normalize::{NormalizedUrl, normalize};
pub use page::FetchedPage;
pub use scope::{Rejection, ScopeFilter};
pub use trap::{TrapDetector, TrapPolicy};
