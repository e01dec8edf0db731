use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the updater.
/// Every fallible core operation returns `Result<T, UpdaterError>`.
///
/// Per-artifact soft failures (no catalog match, no compatible version) are
/// not errors; they are recorded as [`UpdateOutcome`](crate::core::matcher::UpdateOutcome)s.
#[derive(Debug, Error)]
pub enum UpdaterError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Refusing to write unsafe file name: {0:?}")]
    InvalidFileName(String),

    #[error("Archive already holds {0:?}, refusing to overwrite it")]
    ArchiveCollision(PathBuf),

    #[error("{0:?} already exists and was not archived, refusing to overwrite it")]
    WouldOverwrite(PathBuf),

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Version validation ──────────────────────────────
    #[error("Game version {0:?} is not known to the catalog")]
    UnknownGameVersion(String),

    #[error("Catalog lists no release game version")]
    NoReleaseVersion,

    // ── Run control ─────────────────────────────────────
    #[error("Interrupted")]
    Interrupted,

    #[error("Run timed out after {0}s")]
    TimedOut(u64),

    // ── Configuration ───────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type UpdaterResult<T> = Result<T, UpdaterError>;

impl UpdaterError {
    /// Build an `Io` error bound to the path that failed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UpdaterError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the requested target version was rejected before any side effects.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UpdaterError::UnknownGameVersion(_) | UpdaterError::NoReleaseVersion
        )
    }
}

impl From<std::io::Error> for UpdaterError {
    fn from(source: std::io::Error) -> Self {
        UpdaterError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
