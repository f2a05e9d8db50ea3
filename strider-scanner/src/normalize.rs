//! URL canonicalization.
//!
//! A [`NormalizedUrl`] is an absolute URL with its fragment removed. Scheme and
//! host are lowercased by WHATWG parsing; path and query are left untouched.

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Absolute, fragment-free URL used as page identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Parse an absolute URL.
    pub fn parse(raw: &str) -> Result<Self> {
        normalize(raw, None)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Hostname, already lowercase. `None` for host-less URLs such as `mailto:`.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<NormalizedUrl> for String {
    fn from(url: NormalizedUrl) -> Self {
        url.into_string()
    }
}

impl TryFrom<String> for NormalizedUrl {
    type Error = ScanError;

    fn try_from(raw: String) -> Result<Self> {
        NormalizedUrl::parse(&raw)
    }
}

/// Resolve `raw` against `base` (when given) and strip the fragment.
///
/// `normalize(normalize(u)) == normalize(u)` and `normalize(u + "#x") == normalize(u)`.
pub fn normalize(raw: &str, base: Option<&Url>) -> Result<NormalizedUrl> {
    let raw = raw.trim();
    let parsed = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| ScanError::invalid_url(raw, e))?;

    let mut url = parsed;
    url.set_fragment(None);
    Ok(NormalizedUrl(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fragment() {
        let a = normalize("https://www.ics.uci.edu/about#staff", None).unwrap();
        let b = normalize("https://www.ics.uci.edu/about", None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://www.ics.uci.edu/about");
    }

    #[test]
    fn test_lowercases_scheme_and_host_only() {
        let url = normalize("HTTPS://WWW.ICS.UCI.EDU/People/Index.php?Id=A", None).unwrap();
        assert_eq!(url.as_str(), "https://www.ics.uci.edu/People/Index.php?Id=A");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("http://Vision.ICS.uci.edu/a/../b/?q=1#top", None).unwrap();
        let twice = normalize(once.as_str(), None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resolves_relative_against_base() {
        let base = Url::parse("https://www.stat.uci.edu/news/index.html").unwrap();
        let url = normalize("../people/#faculty", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://www.stat.uci.edu/people/");
    }

    #[test]
    fn test_keeps_query() {
        let base = Url::parse("https://www.cs.uci.edu/").unwrap();
        let url = normalize("/events?page=2#list", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://www.cs.uci.edu/events?page=2");
    }

    #[test]
    fn test_fragment_only_href_resolves_to_base() {
        let base = Url::parse("https://www.cs.uci.edu/faculty").unwrap();
        let url = normalize("#section-2", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://www.cs.uci.edu/faculty");
    }

    #[test]
    fn test_relative_without_base_is_invalid() {
        let err = normalize("/just/a/path", None).unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl { .. }));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(NormalizedUrl::parse("http://").is_err());
        assert!(NormalizedUrl::parse("").is_err());
    }
}
