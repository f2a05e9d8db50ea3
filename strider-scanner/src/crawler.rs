use crate::error::{Result, ScanError};
use crate::html::parse_html;
use crate::page::FetchedPage;
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Error returned by a [`PageCallback`]. Stops the crawl.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Called once per fetched page; returns the URLs to enqueue next.
///
/// Runs on the blocking pool, so it may do synchronous I/O.
pub type PageCallback =
    Arc<dyn Fn(FetchedPage) -> std::result::Result<Vec<String>, HandlerError> + Send + Sync>;

type WorkQueues = Arc<Vec<Mutex<VecDeque<(String, usize)>>>>;

/// Totals for a finished crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_fetched: usize,
    pub fetch_errors: usize,
    pub urls_enqueued: usize,
}

/// Reference frontier: a pool of async workers that fetch, parse and hand each
/// page to a [`PageCallback`]. Deduplication and scope are the callback's job.
pub struct Crawler {
    client: Client,
    max_depth: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Strider/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_depth: 5,
            progress_callback: None,
        })
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Crawl from `seeds` until the frontier drains or the callback fails.
    pub async fn crawl(
        &self,
        seeds: &[String],
        workers: usize,
        on_page: PageCallback,
    ) -> Result<CrawlSummary> {
        let workers = workers.max(1);
        info!("Starting crawl of {} seed(s) with {} workers", seeds.len(), workers);

        let worker_queues: WorkQueues =
            Arc::new((0..workers).map(|_| Mutex::new(VecDeque::new())).collect());

        // Queued plus in-progress items; the crawl ends when this reaches zero.
        let pending = Arc::new(AtomicUsize::new(0));
        let abort = Arc::new(AtomicBool::new(false));
        let failure: Arc<Mutex<Option<ScanError>>> = Arc::new(Mutex::new(None));
        let pages_fetched = Arc::new(AtomicUsize::new(0));
        let fetch_errors = Arc::new(AtomicUsize::new(0));
        let urls_enqueued = Arc::new(AtomicUsize::new(0));

        for (idx, seed) in seeds.iter().enumerate() {
            pending.fetch_add(1, Ordering::SeqCst);
            worker_queues[idx % workers]
                .lock()
                .await
                .push_back((seed.clone(), 0));
        }

        let mut worker_handles = Vec::new();

        for worker_id in 0..workers {
            let client = self.client.clone();
            let progress_cb = self.progress_callback.clone();
            let on_page = on_page.clone();
            let max_depth = self.max_depth;
            let worker_queues = worker_queues.clone();
            let pending = pending.clone();
            let abort = abort.clone();
            let failure = failure.clone();
            let pages_fetched = pages_fetched.clone();
            let fetch_errors = fetch_errors.clone();
            let urls_enqueued = urls_enqueued.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);

                loop {
                    if abort.load(Ordering::SeqCst) {
                        break;
                    }

                    let work_item = { worker_queues[worker_id].lock().await.pop_front() };
                    let work_item = match work_item {
                        Some(item) => Some(item),
                        None => Self::steal(&worker_queues, worker_id).await,
                    };

                    let Some((url, depth)) = work_item else {
                        if pending.load(Ordering::SeqCst) == 0 {
                            break;
                        }
                        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                        continue;
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.clone());
                    }

                    let page = match Self::fetch_page(&client, &url).await {
                        Ok(page) => {
                            pages_fetched.fetch_add(1, Ordering::Relaxed);
                            page
                        }
                        Err(e) => {
                            warn!("Fetch error for {}: {}", url, e);
                            fetch_errors.fetch_add(1, Ordering::Relaxed);
                            FetchedPage::failed(url.clone())
                        }
                    };

                    let handler = on_page.clone();
                    let outcome = tokio::task::spawn_blocking(move || handler(page)).await;

                    match outcome {
                        Ok(Ok(next_urls)) if depth + 1 < max_depth => {
                            let num_workers = worker_queues.len();
                            debug!(
                                "[Worker {}] Distributing {} URLs across {} workers",
                                worker_id,
                                next_urls.len(),
                                num_workers
                            );
                            for (offset, next_url) in next_urls.into_iter().enumerate() {
                                let target = (worker_id + 1 + offset) % num_workers;
                                pending.fetch_add(1, Ordering::SeqCst);
                                urls_enqueued.fetch_add(1, Ordering::Relaxed);
                                worker_queues[target]
                                    .lock()
                                    .await
                                    .push_back((next_url, depth + 1));
                            }
                        }
                        Ok(Ok(next_urls)) => {
                            if !next_urls.is_empty() {
                                debug!(
                                    "Depth limit reached at {}, dropping {} URLs",
                                    url,
                                    next_urls.len()
                                );
                            }
                        }
                        Ok(Err(e)) => {
                            warn!("Page handler failed for {}: {}", url, e);
                            Self::record_failure(&failure, &abort, ScanError::Handler(e)).await;
                        }
                        Err(e) => {
                            Self::record_failure(&failure, &abort, ScanError::JoinError(e)).await;
                        }
                    }

                    pending.fetch_sub(1, Ordering::SeqCst);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for result in futures::future::join_all(worker_handles).await {
            result.map_err(|e| ScanError::Other(format!("Worker task failed: {}", e)))?;
        }

        if let Some(error) = failure.lock().await.take() {
            return Err(error);
        }

        let summary = CrawlSummary {
            pages_fetched: pages_fetched.load(Ordering::Relaxed),
            fetch_errors: fetch_errors.load(Ordering::Relaxed),
            urls_enqueued: urls_enqueued.load(Ordering::Relaxed),
        };
        info!(
            "Crawl complete. Fetched {} pages ({} fetch errors)",
            summary.pages_fetched, summary.fetch_errors
        );
        Ok(summary)
    }

    /// Take one item from the back of another worker's queue.
    async fn steal(worker_queues: &WorkQueues, worker_id: usize) -> Option<(String, usize)> {
        let num_workers = worker_queues.len();
        for offset in 1..num_workers {
            let victim = (worker_id + offset) % num_workers;
            if let Some(item) = worker_queues[victim].lock().await.pop_back() {
                debug!("Worker {} stole work from worker {}", worker_id, victim);
                return Some(item);
            }
        }
        None
    }

    async fn record_failure(
        failure: &Mutex<Option<ScanError>>,
        abort: &AtomicBool,
        error: ScanError,
    ) {
        abort.store(true, Ordering::SeqCst);
        let mut slot = failure.lock().await;
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    /// Fetch `url` and reduce the response to a [`FetchedPage`].
    pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = client.get(url).send().await?;

        let mut page = FetchedPage::new(url)
            .with_status(response.status().as_u16())
            .with_final_url(response.url().as_str());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                page = page.with_header(name.as_str(), value);
            }
        }

        let body = response.text().await?;
        debug!("Fetched {} in {:?} ({} bytes)", url, start.elapsed(), body.len());

        if body.is_empty() {
            return Ok(page);
        }

        if page.is_html() {
            let parsed = parse_html(&body);
            page.links = parsed.links;
            page.text = Some(parsed.text);
        } else {
            page.text = Some(String::new());
        }

        Ok(page)
    }
}
