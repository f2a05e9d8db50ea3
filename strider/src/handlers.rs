use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strider_core::analytics::AnalyticsState;
use strider_core::config::{CrawlConfig, STOP_WORDS_FILE};
use strider_core::crawl::{CrawlContext, CrawlOptions, CrawlProgressCallback, execute_crawl};
use strider_core::error::Result as CrawlResult;
use strider_core::report::{
    ReportFormat, ReportOptions, gather_report_data, generate_json_report, generate_text_report,
};
use strider_core::stopwords::{DEFAULT_STOP_WORDS, StopWords};
use strider_core::store::AnalyticsStore;
use strider_scanner::scope::DEFAULT_ALLOWED_DOMAINS;
use strider_scanner::{CrawlSummary, NormalizedUrl, Rejection, ScopeFilter, TrapPolicy};
use tracing::{info, warn};
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(url: Option<&Url>, hosts_file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        bail!("Either --url or --hosts-file must be provided")
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("Cannot expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Build the crawl configuration from `crawl` subcommand matches.
pub fn crawl_config_from_matches(args: &ArgMatches) -> Result<CrawlConfig> {
    let data_dir = args
        .get_one::<String>("data-dir")
        .map(String::as_str)
        .unwrap_or(crate::commands::DEFAULT_DATA_DIR);

    let mut config = CrawlConfig::default().with_data_dir(expand_path(data_dir)?);

    if let Some(domains) = args.get_many::<String>("allowed-domain") {
        config = config.with_allowed_domains(domains.cloned());
    }
    if let Some(root) = args.get_one::<String>("root-domain") {
        config = config.with_root_domain(root.clone());
    }
    if args.get_flag("trap-policy") {
        config = config.with_trap_policy(Some(TrapPolicy::default()));
    }

    Ok(config)
}

pub fn print_banner() {
    println!(
        "{} {}",
        "strider".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}", "scoped crawling with durable analytics".bright_black());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

/// Write the bundled stop-word list into `data_dir`, creating it if needed.
pub fn install_stop_words(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let stop_words_path = data_dir.join(STOP_WORDS_FILE);
    fs::write(&stop_words_path, DEFAULT_STOP_WORDS)
        .with_context(|| format!("Failed to write {}", stop_words_path.display()))?;

    Ok(stop_words_path)
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  STRIDER INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(crate::commands::DEFAULT_DATA_DIR);
    let force = args.get_flag("force");
    let data_dir = expand_path(raw_path)?;
    let stop_words_path = data_dir.join(STOP_WORDS_FILE);

    println!(
        "{} Target: {}",
        "→".blue(),
        data_dir.display().to_string().bright_white()
    );
    println!();

    if stop_words_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A stop-word list already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            stop_words_path.display().to_string().bright_white()
        );
        println!();
        println!("{}", "This operation will overwrite it.".yellow());

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    println!("{} Installing default stop-word list...", "→".blue());
    let installed = install_stop_words(&data_dir)?;
    let line_count = DEFAULT_STOP_WORDS.lines().count();
    println!(
        "  {} {} ({} entries)",
        "✓".green().bold(),
        installed.display().to_string().bright_white(),
        line_count.to_string().cyan()
    );

    let store = AnalyticsStore::new(data_dir.join(strider_core::config::ANALYTICS_FILE));
    if store.exists() {
        println!(
            "  {} Existing analytics kept: {}",
            "ℹ".blue(),
            store.path().display().to_string().bright_white()
        );
    }

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool) -> Result<()> {
    let url = args.get_one::<Url>("url");
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    let threads = args.get_one::<usize>("threads").copied().unwrap_or(10);
    let max_depth = args.get_one::<usize>("max-depth").copied().unwrap_or(5);
    let timeout_secs = args.get_one::<u64>("timeout").copied().unwrap_or(10);

    let urls = load_urls_from_source(url, hosts_file)?;
    let config = crawl_config_from_matches(args)?;

    if !quiet {
        println!("{} Crawling {} seed(s)", "🕷️".bold(), urls.len());
        println!("Workers: {}", threads);
        println!("Max depth: {}", max_depth);
        println!("Allowed: {}", config.allowed_domains.join(", "));
        println!("Store: {}\n", config.store_path().display());
    }

    let context = Arc::new(CrawlContext::init(config));
    let before = context.snapshot()?.unique_page_count();

    let options = CrawlOptions {
        urls,
        threads,
        max_depth,
        timeout_secs,
        show_progress_bars: !quiet,
    };

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{}", msg);
        }))
    };

    let crawl_result = execute_crawl(Arc::clone(&context), options, progress_callback).await;

    // Flush whatever was recorded, even when the crawl stopped early.
    let flush_result = match Arc::try_unwrap(context) {
        Ok(context) => context.shutdown().map_err(anyhow::Error::from),
        Err(_) => Err(anyhow!("crawl workers still hold the crawl context")),
    };

    let (summary, state) = finish_crawl(crawl_result, flush_result)?;
    info!(
        "Crawl finished: {} fetched, {} fetch errors",
        summary.pages_fetched, summary.fetch_errors
    );

    println!();
    print_divider();
    println!("{}", "  CRAWL COMPLETE".green().bold());
    print_divider();
    println!(
        "{} Pages fetched: {}",
        "✓".green().bold(),
        summary.pages_fetched.to_string().cyan()
    );
    println!(
        "{} Fetch errors: {}",
        if summary.fetch_errors == 0 {
            "✓".green().bold()
        } else {
            "⚠".yellow().bold()
        },
        summary.fetch_errors.to_string().cyan()
    );
    println!(
        "{} Unique pages recorded: {} ({} new)",
        "✓".green().bold(),
        state.unique_page_count().to_string().cyan(),
        state.unique_page_count().saturating_sub(before).to_string().cyan()
    );
    println!(
        "{} Longest page: {} ({} words)",
        "✓".green().bold(),
        state.longest_page.url.bright_white(),
        state.longest_page.word_count
    );
    println!();
    Ok(())
}

/// Combine the crawl and final flush results. A crawl error wins; a flush
/// failure on top of it is kept in the message rather than replacing it.
pub fn finish_crawl(
    crawl_result: CrawlResult<CrawlSummary>,
    flush_result: Result<AnalyticsState>,
) -> Result<(CrawlSummary, AnalyticsState)> {
    match (crawl_result, flush_result) {
        (Ok(summary), Ok(state)) => Ok((summary, state)),
        (Err(crawl_err), Ok(_)) => Err(anyhow::Error::new(crawl_err).context("Crawl failed")),
        (Ok(_), Err(flush_err)) => Err(flush_err.context("Failed to flush analytics")),
        (Err(crawl_err), Err(flush_err)) => {
            warn!("Failed to flush analytics after crawl error: {:#}", flush_err);
            Err(anyhow::Error::new(crawl_err).context(format!(
                "Crawl failed (flushing analytics also failed: {:#})",
                flush_err
            )))
        }
    }
}

/// Load the store under `data_dir` and render it.
pub fn render_report(
    data_dir: &Path,
    stop_words_path: Option<&Path>,
    options: &ReportOptions,
    format: ReportFormat,
) -> Result<String> {
    let store = AnalyticsStore::new(data_dir.join(strider_core::config::ANALYTICS_FILE));
    let outcome = store.load();
    if !outcome.is_loaded() {
        warn!("No usable analytics at {}", store.path().display());
    }
    let state = outcome.into_state();

    let stop_words_path = stop_words_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join(STOP_WORDS_FILE));
    let stop_words = StopWords::load(&stop_words_path)
        .with_context(|| format!("Failed to read stop words {}", stop_words_path.display()))?;

    let data = gather_report_data(&state, &stop_words, options);
    match format {
        ReportFormat::Text => Ok(generate_text_report(&data, options.top_words)),
        ReportFormat::Json => Ok(generate_json_report(&data)?),
    }
}

pub fn handle_report(args: &ArgMatches) -> Result<()> {
    let data_dir = args
        .get_one::<String>("data-dir")
        .map(String::as_str)
        .unwrap_or(crate::commands::DEFAULT_DATA_DIR);
    let data_dir = expand_path(data_dir)?;
    let stop_words_path = args.get_one::<PathBuf>("stop-words");
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let mut options = ReportOptions::default();
    if let Some(top) = args.get_one::<usize>("top") {
        options.top_words = *top;
    }
    if let Some(root) = args.get_one::<String>("root-domain") {
        options.root_domain = root.clone();
    }

    let report = render_report(&data_dir, stop_words_path.map(PathBuf::as_path), &options, format)?;

    match args.get_one::<PathBuf>("output") {
        Some(output) => {
            fs::write(output, format!("{}\n", report))
                .with_context(|| format!("Failed to write report to {}", output.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                output.display().to_string().bright_white()
            );
        }
        None => println!("{}", report),
    }
    Ok(())
}

/// Result of checking one raw URL against a scope filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeVerdict {
    InScope(NormalizedUrl),
    OutOfScope(NormalizedUrl, Rejection),
    Malformed(String),
}

pub fn check_scope(filter: &ScopeFilter, raw: &str) -> ScopeVerdict {
    match NormalizedUrl::parse(raw) {
        Ok(url) => match filter.check(&url) {
            Ok(()) => ScopeVerdict::InScope(url),
            Err(rejection) => ScopeVerdict::OutOfScope(url, rejection),
        },
        Err(e) => ScopeVerdict::Malformed(e.to_string()),
    }
}

pub fn handle_scope(args: &ArgMatches) -> Result<()> {
    let filter = match args.get_many::<String>("allowed-domain") {
        Some(domains) => ScopeFilter::new(domains),
        None => ScopeFilter::new(DEFAULT_ALLOWED_DOMAINS),
    };

    for raw in args.get_many::<String>("URLS").into_iter().flatten() {
        match check_scope(&filter, raw) {
            ScopeVerdict::InScope(url) => {
                println!("{} {}", "✓ in scope    ".green().bold(), url)
            }
            ScopeVerdict::OutOfScope(url, rejection) => println!(
                "{} {} {}",
                "✗ out of scope".red().bold(),
                url,
                format!("({})", rejection.as_str()).bright_black()
            ),
            ScopeVerdict::Malformed(reason) => {
                println!("{} {}", "⚠ malformed   ".yellow().bold(), reason)
            }
        }
    }
    Ok(())
}
