use crate::analytics::AnalyticsState;
use crate::error::StoreError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of reading the store. Every variant yields a usable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The document was read and parsed.
    Loaded(AnalyticsState),
    /// No document yet; fresh start.
    NotFound,
    /// The document was unreadable or malformed. `backup` is where
    /// [`recover`](AnalyticsStore::recover) moved it, if anywhere.
    Discarded {
        reason: String,
        backup: Option<PathBuf>,
    },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn into_state(self) -> AnalyticsState {
        match self {
            LoadOutcome::Loaded(state) => state,
            LoadOutcome::NotFound | LoadOutcome::Discarded { .. } => AnalyticsState::default(),
        }
    }
}

/// JSON document on disk holding an [`AnalyticsState`].
#[derive(Debug, Clone)]
pub struct AnalyticsStore {
    path: PathBuf,
}

impl AnalyticsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the document. Never touches the filesystem beyond reading, so a
    /// corrupt document comes back as `Discarded` with no backup.
    pub fn load(&self) -> LoadOutcome {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::NotFound,
            Err(e) => {
                return LoadOutcome::Discarded {
                    reason: format!("unreadable: {}", e),
                    backup: None,
                };
            }
        };

        match serde_json::from_str::<AnalyticsState>(&content) {
            Ok(state) => {
                debug!(
                    "Loaded analytics for {} pages from {}",
                    state.unique_page_count(),
                    self.path.display()
                );
                LoadOutcome::Loaded(state)
            }
            Err(e) => LoadOutcome::Discarded {
                reason: format!("malformed: {}", e),
                backup: None,
            },
        }
    }

    /// [`load`](Self::load) for a writer: a corrupt document is moved aside
    /// first so the next save does not destroy it.
    pub fn recover(&self) -> LoadOutcome {
        match self.load() {
            LoadOutcome::Discarded { reason, .. } => {
                let backup = match self.quarantine() {
                    Ok(backup) => Some(backup),
                    Err(e) => {
                        warn!(
                            "Could not move corrupt store {} aside: {}",
                            self.path.display(),
                            e
                        );
                        None
                    }
                };
                LoadOutcome::Discarded { reason, backup }
            }
            outcome => outcome,
        }
    }

    /// Replace the document with `state`.
    ///
    /// Writes a sibling `.tmp` file, syncs it and renames it over the target, so
    /// an interrupted save leaves the previous document intact.
    pub fn save(&self, state: &AnalyticsState) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(state)?;
        let temp_path = self.sibling("tmp");

        self.write_atomic(&temp_path, &encoded)
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn write_atomic(&self, temp_path: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;

        let mut file = File::create(temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(temp_path, &self.path)?;
        sync_dir(parent)
    }

    /// Move the document to the first free `<path>.corrupt[.N]`.
    fn quarantine(&self) -> io::Result<PathBuf> {
        let mut backup = self.sibling("corrupt");
        let mut n = 1;
        while backup.exists() {
            backup = self.sibling(&format!("corrupt.{}", n));
            n += 1;
        }
        fs::rename(&self.path, &backup)?;
        Ok(backup)
    }

    /// `<path>.<suffix>`
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// Persist a rename by syncing the directory entry.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
