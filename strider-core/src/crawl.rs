use crate::analytics::{AnalyticsAggregator, AnalyticsState};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};
use crate::store::{AnalyticsStore, LoadOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use strider_scanner::{
    CrawlSummary, Crawler, FetchedPage, HandlerError, NormalizedUrl, PageCallback, ScopeFilter,
    TrapDetector, TrapPolicy, normalize,
};
use tracing::{debug, info, warn};

/// Options for the reference crawl driver
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub threads: usize,
    pub max_depth: usize,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            threads: 10,
            max_depth: 5,
            timeout_secs: 10,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Shared state for one crawl process: scope rules, the seen-set and the
/// analytics aggregator. Share it with `Arc`; every method takes `&self`.
pub struct CrawlContext {
    config: CrawlConfig,
    scope: ScopeFilter,
    trap_policy: Option<TrapPolicy>,
    seen: Mutex<TrapDetector>,
    analytics: Mutex<AnalyticsAggregator>,
}

impl CrawlContext {
    /// Load the store named by `config`, log how that went, and build a context.
    pub fn init(config: CrawlConfig) -> Self {
        let store = AnalyticsStore::new(config.store_path());
        let outcome = store.recover();
        log_load_outcome(&store, &outcome);
        Self::new(config, outcome.into_state(), Some(store))
    }

    /// Build a context around an already-loaded state.
    pub fn new(config: CrawlConfig, state: AnalyticsState, store: Option<AnalyticsStore>) -> Self {
        let analytics = AnalyticsAggregator::new(state, store, &config.root_domain);
        Self {
            scope: config.scope_filter(),
            trap_policy: config.trap_policy.clone(),
            seen: Mutex::new(TrapDetector::new()),
            analytics: Mutex::new(analytics),
            config,
        }
    }

    /// Context that never touches the filesystem.
    pub fn in_memory(config: CrawlConfig) -> Self {
        Self::new(config, AnalyticsState::default(), None)
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    /// The crawl callback: record the page and return the links to follow.
    pub fn scrape(&self, page: &FetchedPage) -> Result<Vec<NormalizedUrl>> {
        let requested = normalize(&page.requested_url, None)?;
        self.seen()?.mark_seen(&requested);

        if page.status_code != 200 || page.text.is_none() {
            debug!(
                "No content from {} (status {})",
                requested, page.status_code
            );
            return Ok(Vec::new());
        }

        if !page.is_html() {
            debug!(
                "Skipping {} with content type {:?}",
                requested,
                page.content_type()
            );
            return Ok(Vec::new());
        }

        let final_url = normalize(page.effective_url(), None)?;
        self.seen()?.mark_seen(&final_url);

        let text = page.text.as_deref().unwrap_or_default();
        {
            let mut analytics = self.analytics()?;
            // The seen-set does not survive restarts; unique_urls does.
            if analytics.state().contains_page(&final_url) {
                debug!("Already recorded {}, skipping analytics", final_url);
            } else {
                analytics.add_page(&final_url, text)?;
            }
        }

        let base = final_url.as_url();
        let candidates: Vec<NormalizedUrl> = page
            .links
            .iter()
            .filter_map(|href| match normalize(href, Some(base)) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!("Skipping unparseable link on {}: {}", final_url, e);
                    None
                }
            })
            .collect();

        let mut seen = self.seen()?;
        let eligible: Vec<NormalizedUrl> = candidates
            .into_iter()
            .filter(|url| self.passes_filters(url) && seen.mark_and_check(url))
            .collect();

        debug!(
            "{}: {} of {} links eligible",
            final_url,
            eligible.len(),
            page.links.len()
        );
        Ok(eligible)
    }

    /// Scope, optional trap policy, then the seen-set. Marks the URL seen on success.
    pub fn is_eligible(&self, url: &NormalizedUrl) -> Result<bool> {
        if !self.passes_filters(url) {
            return Ok(false);
        }
        Ok(self.seen()?.mark_and_check(url))
    }

    fn passes_filters(&self, url: &NormalizedUrl) -> bool {
        if !self.scope.is_in_scope(url) {
            return false;
        }
        if let Some(ref policy) = self.trap_policy
            && let Some(rule) = policy.violation(url)
        {
            debug!("Trap policy ({}) rejected {}", rule, url);
            return false;
        }
        true
    }

    pub fn seen_count(&self) -> Result<usize> {
        Ok(self.seen()?.len())
    }

    /// Copy of the current analytics state.
    pub fn snapshot(&self) -> Result<AnalyticsState> {
        Ok(self.analytics()?.state().clone())
    }

    /// Final flush. Returns the state as persisted.
    pub fn shutdown(self) -> Result<AnalyticsState> {
        let analytics = self
            .analytics
            .into_inner()
            .map_err(|_| CrawlError::Poisoned("analytics"))?;
        analytics.flush()?;
        Ok(analytics.into_state())
    }

    /// Adapt [`scrape`](Self::scrape) to the reference driver's callback.
    pub fn page_callback(self: &Arc<Self>) -> PageCallback {
        let context = Arc::clone(self);
        Arc::new(
            move |page: FetchedPage| -> std::result::Result<Vec<String>, HandlerError> {
                let links = context.scrape(&page)?;
                Ok(links.into_iter().map(NormalizedUrl::into_string).collect())
            },
        )
    }

    fn seen(&self) -> Result<MutexGuard<'_, TrapDetector>> {
        self.seen.lock().map_err(|_| CrawlError::Poisoned("seen-set"))
    }

    fn analytics(&self) -> Result<MutexGuard<'_, AnalyticsAggregator>> {
        self.analytics
            .lock()
            .map_err(|_| CrawlError::Poisoned("analytics"))
    }
}

fn log_load_outcome(store: &AnalyticsStore, outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Loaded(state) => info!(
            "Resuming analytics from {} ({} pages)",
            store.path().display(),
            state.unique_page_count()
        ),
        LoadOutcome::NotFound => info!(
            "No analytics at {}, starting fresh",
            store.path().display()
        ),
        LoadOutcome::Discarded { reason, backup } => warn!(
            "Discarded analytics at {} ({}); backup: {}",
            store.path().display(),
            reason,
            backup
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        ),
    }
}

/// Run the reference driver over `options.urls`, feeding every page to `context`.
pub async fn execute_crawl(
    context: Arc<CrawlContext>,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    let CrawlOptions {
        urls,
        threads,
        max_depth,
        timeout_secs,
        show_progress_bars,
    } = options;

    let mut seeds = Vec::new();
    for raw in &urls {
        let url = normalize(raw, None)?;
        if !context.scope().is_in_scope(&url) {
            warn!("Seed {} is out of scope, skipping", url);
            if let Some(ref callback) = progress_callback {
                callback(format!("[!]  Seed out of scope: {}", url));
            }
            continue;
        }
        if context.is_eligible(&url)? {
            seeds.push(url.into_string());
        }
    }

    if seeds.is_empty() {
        warn!("No in-scope seeds to crawl");
        return Ok(CrawlSummary::default());
    }

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: strider_scanner::ProgressCallback = {
        let pb = progress_bar.clone();
        let count = processed_count.clone();
        Arc::new(move |_worker_id: usize, url: String| {
            let done = count.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!("Crawling... {} URLs processed ({})", done, url));
            }
        })
    };

    let crawler = Crawler::with_timeout(timeout_secs)?
        .with_max_depth(max_depth)
        .with_progress_callback(internal_progress_callback);

    if let Some(ref callback) = progress_callback {
        callback(format!("Crawling {} seed(s) with {} workers", seeds.len(), threads));
    }

    let result = crawler
        .crawl(&seeds, threads, context.page_callback())
        .await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    Ok(result?)
}
