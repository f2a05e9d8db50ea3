use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fetched response, already reduced to links and text by the HTML parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL the frontier asked for.
    pub requested_url: String,
    /// URL after redirects. May be empty when the fetch failed.
    pub final_url: String,
    /// HTTP status, or 0 when no response was received.
    pub status_code: u16,
    /// Response headers with lowercased names.
    pub headers: HashMap<String, String>,
    /// Raw `href` values in document order.
    pub links: Vec<String>,
    /// Tag-stripped, whitespace-normalized text. `None` when there was no body.
    pub text: Option<String>,
}

impl FetchedPage {
    pub fn new(requested_url: impl Into<String>) -> Self {
        Self {
            requested_url: requested_url.into(),
            ..Default::default()
        }
    }

    /// A page for which no response was received.
    pub fn failed(requested_url: impl Into<String>) -> Self {
        Self::new(requested_url)
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// `text/html` or `application/xhtml+xml`, ignoring parameters and case.
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| {
                let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                mime == "text/html" || mime == "application/xhtml+xml"
            })
            .unwrap_or(false)
    }

    /// `final_url` when present, otherwise `requested_url`.
    pub fn effective_url(&self) -> &str {
        if self.final_url.trim().is_empty() {
            &self.requested_url
        } else {
            &self.final_url
        }
    }
}
