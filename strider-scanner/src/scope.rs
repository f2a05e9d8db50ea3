use crate::error::Result;
use crate::normalize::NormalizedUrl;
use tracing::debug;

/// Low-value binary, media and document extensions that are never crawled.
pub const DENIED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx",
    "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

/// Default allowed domain suffixes.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    ".ics.uci.edu",
    ".cs.uci.edu",
    ".informatics.uci.edu",
    ".stat.uci.edu",
];

/// Why a URL was rejected by [`ScopeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Scheme,
    Domain,
    Extension,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Scheme => "scheme",
            Rejection::Domain => "domain",
            Rejection::Extension => "extension",
        }
    }
}

/// Pure predicate over normalized URLs: scheme, allowed domain, extension.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    allowed_suffixes: Vec<String>,
}

impl ScopeFilter {
    /// Suffixes are lowercased; a missing leading dot is added.
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_suffixes = allowed_domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty() && d != ".")
            .map(|d| if d.starts_with('.') { d } else { format!(".{}", d) })
            .collect();

        Self { allowed_suffixes }
    }

    pub fn allowed_suffixes(&self) -> &[String] {
        &self.allowed_suffixes
    }

    pub fn is_in_scope(&self, url: &NormalizedUrl) -> bool {
        match self.check(url) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Out of scope ({}): {}", reason.as_str(), url);
                false
            }
        }
    }

    /// Parse `raw` and check it. Malformed input is an error, not a rejection.
    pub fn check_str(&self, raw: &str) -> Result<bool> {
        let url = NormalizedUrl::parse(raw)?;
        Ok(self.is_in_scope(&url))
    }

    /// Same checks as [`is_in_scope`](Self::is_in_scope), reporting the first failure.
    pub fn check(&self, url: &NormalizedUrl) -> std::result::Result<(), Rejection> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Rejection::Scheme);
        }

        let host = url.host().unwrap_or_default().to_ascii_lowercase();
        if !self.host_allowed(&host) {
            return Err(Rejection::Domain);
        }

        if has_denied_extension(url.path()) {
            return Err(Rejection::Extension);
        }

        Ok(())
    }

    fn host_allowed(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        self.allowed_suffixes
            .iter()
            .any(|suffix| host.ends_with(suffix.as_str()) || host == &suffix[1..])
    }
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS)
    }
}

/// Extension of the final path segment, lowercased.
pub fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

pub fn has_denied_extension(path: &str) -> bool {
    path_extension(path)
        .map(|ext| DENIED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
