// ─── Version Gate ───
// Validates the requested target game version against the catalog's tag list.
// The tag list is fetched once per run and never refetched.

use tracing::{debug, error, info};

use crate::core::catalog::{CatalogClient, GameVersionTag, VersionKind};
use crate::core::config::VersionRequest;
use crate::core::error::{UpdaterError, UpdaterResult};

/// In-memory game version tags, newest first.
#[derive(Debug, Clone)]
pub struct VersionGate {
    tags: Vec<GameVersionTag>,
}

impl VersionGate {
    pub fn new(tags: Vec<GameVersionTag>) -> Self {
        Self { tags }
    }

    /// Fetch the tag list from the catalog. Startup fails here if the
    /// catalog is unreachable or answers with nothing.
    pub async fn load(catalog: &dyn CatalogClient) -> UpdaterResult<Self> {
        let tags = catalog.fetch_game_versions().await?;
        Ok(Self::new(tags))
    }

    pub fn tags(&self) -> &[GameVersionTag] {
        &self.tags
    }

    /// Newest tag of kind `release`.
    pub fn latest_release(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.kind == VersionKind::Release)
            .map(|tag| tag.version.as_str())
    }

    pub fn is_known(&self, version: &str) -> bool {
        self.tags.iter().any(|tag| tag.version == version)
    }

    /// Turn a request into a validated version string.
    ///
    /// `Latest` picks the newest release; an explicit version must match a
    /// tag exactly. A rejection must end the run before any file is touched.
    pub fn validate(&self, request: &VersionRequest) -> UpdaterResult<String> {
        match request {
            VersionRequest::Latest => {
                debug!("Getting latest version.");
                let latest = self.latest_release().ok_or(UpdaterError::NoReleaseVersion)?;
                info!("Latest release version: {}", latest);
                Ok(latest.to_string())
            }
            VersionRequest::Exact(version) => {
                if self.is_known(version) {
                    debug!("Version ({}) is valid.", version);
                    Ok(version.clone())
                } else {
                    error!("Version ({}) is not valid.", version);
                    Err(UpdaterError::UnknownGameVersion(version.clone()))
                }
            }
        }
    }
}
