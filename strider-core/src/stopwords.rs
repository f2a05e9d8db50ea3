use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Bundled English stop-word list, installed by `strider init`.
pub const DEFAULT_STOP_WORDS: &str = include_str!("../stopwords/default.txt");

/// Immutable set of lowercase tokens hidden from the word-frequency view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// One token per line. A missing file is an empty list, not an error.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No stop-word list at {}, using none", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn parse(content: &str) -> Self {
        Self::new(content.lines())
    }

    pub fn default_list() -> Self {
        Self::parse(DEFAULT_STOP_WORDS)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_lowercases() {
        let words = StopWords::parse("The\n  AND \n\nof\n");
        assert_eq!(words.len(), 3);
        assert!(words.contains("the"));
        assert!(words.contains("and"));
        assert!(!words.contains(""));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let words = StopWords::load(Path::new("/nonexistent/strider/stop_words.txt")).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn test_default_list() {
        let words = StopWords::default_list();
        assert!(words.contains("the"));
        assert!(!words.contains("crawler"));
    }
}
