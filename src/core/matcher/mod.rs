// ─── Update Matcher ───
// Picks one remote file per artifact for a target game version and loader.
//
// Strategies:
//   bulk        — one `version_files/update` request for the whole batch
//   per-project — each project's version list, filtered locally
//
// Remote ordering is authoritative: the first matching version and its
// first file win. No semantic version comparison happens here.

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::core::catalog::{CatalogClient, CatalogIdentity, CatalogVersion, ResolvedFile};
use crate::core::config::MatchStrategy;
use crate::core::hashing::Artifact;
use crate::core::loader::LoaderType;
use crate::core::resolver::{ResolvedArtifact, Resolution};

/// What the matcher decided for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Resolved(ResolvedFile),
    /// The artifact's digest is unknown to the catalog.
    NoIdentity,
    /// Known project, but nothing fits the target version and loader.
    NoCompatibleVersion,
}

/// Matcher result for a single input artifact.
#[derive(Debug, Clone)]
pub struct UpdateResolution {
    pub source: Artifact,
    pub identity: Option<CatalogIdentity>,
    pub outcome: UpdateOutcome,
}

impl UpdateResolution {
    pub fn resolved_file(&self) -> Option<&ResolvedFile> {
        match &self.outcome {
            UpdateOutcome::Resolved(file) => Some(file),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome, UpdateOutcome::Resolved(_))
    }

    fn display_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|identity| identity.title.as_str())
            .unwrap_or(&self.source.filename)
    }
}

/// First version supporting both `loader` and `game_version`, in list order.
pub fn select_compatible<'v>(
    versions: &'v [CatalogVersion],
    loader: &str,
    game_version: &str,
) -> Option<&'v CatalogVersion> {
    versions.iter().find(|v| v.supports(loader, game_version))
}

fn outcome_for(version: Option<&CatalogVersion>) -> UpdateOutcome {
    match version.and_then(CatalogVersion::first_file) {
        Some(file) => UpdateOutcome::Resolved(file),
        None => UpdateOutcome::NoCompatibleVersion,
    }
}

pub struct UpdateMatcher<'a> {
    catalog: &'a dyn CatalogClient,
    concurrency: usize,
}

impl<'a> UpdateMatcher<'a> {
    pub fn new(catalog: &'a dyn CatalogClient, concurrency: usize) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
        }
    }

    /// Produce exactly one `UpdateResolution` per artifact in `resolution`.
    /// Individual failures are recorded as outcomes and never abort the batch.
    pub async fn match_updates(
        &self,
        resolution: &Resolution,
        game_version: &str,
        loader: LoaderType,
        strategy: MatchStrategy,
    ) -> Vec<UpdateResolution> {
        info!(
            "Matching {} mods against {} {}",
            resolution.resolved.len(),
            loader,
            game_version
        );

        let mut results = match strategy {
            MatchStrategy::Bulk => self.match_bulk(&resolution.resolved, game_version, loader).await,
            MatchStrategy::PerProject => {
                self.match_per_project(&resolution.resolved, game_version, loader)
                    .await
            }
        };

        results.extend(resolution.unmatched.iter().map(|artifact| UpdateResolution {
            source: artifact.clone(),
            identity: None,
            outcome: UpdateOutcome::NoIdentity,
        }));

        for result in &results {
            match &result.outcome {
                UpdateOutcome::Resolved(file) => {
                    debug!("{} -> {}", result.source.filename, file.filename)
                }
                UpdateOutcome::NoIdentity => {
                    warn!("Skipping {}: not found in catalog", result.source.filename)
                }
                UpdateOutcome::NoCompatibleVersion => warn!(
                    "Skipping {}: no version for {} {}",
                    result.display_name(),
                    loader,
                    game_version
                ),
            }
        }

        results
    }

    /// One request for every digest. Digests absent from the response have no
    /// compatible version. Falls back to per-project lookups only when the
    /// request itself fails.
    pub async fn match_bulk(
        &self,
        resolved: &[ResolvedArtifact],
        game_version: &str,
        loader: LoaderType,
    ) -> Vec<UpdateResolution> {
        let digests: Vec<String> = resolved.iter().map(|r| r.artifact.digest.clone()).collect();

        let Some(updates) = self
            .catalog
            .resolve_bulk_update(&digests, loader, game_version)
            .await
        else {
            warn!("Bulk lookup unavailable, checking projects one by one");
            return self.match_per_project(resolved, game_version, loader).await;
        };

        debug!("Bulk lookup returned {} of {} mods", updates.len(), digests.len());

        resolved
            .iter()
            .map(|r| UpdateResolution {
                source: r.artifact.clone(),
                identity: Some(r.identity.clone()),
                outcome: outcome_for(updates.get(&r.artifact.digest)),
            })
            .collect()
    }

    /// Fetch each project's version list and keep the first entry that
    /// supports the loader and game version.
    pub async fn match_per_project(
        &self,
        resolved: &[ResolvedArtifact],
        game_version: &str,
        loader: LoaderType,
    ) -> Vec<UpdateResolution> {
        stream::iter(resolved.iter())
            .map(|r| async move {
                let outcome = match self.catalog.fetch_project_versions(&r.identity.id).await {
                    Some(versions) => {
                        outcome_for(select_compatible(&versions, loader.as_str(), game_version))
                    }
                    None => UpdateOutcome::NoCompatibleVersion,
                };
                UpdateResolution {
                    source: r.artifact.clone(),
                    identity: Some(r.identity.clone()),
                    outcome,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::ResolutionEngine;
    use crate::core::test_fixtures::{artifact, catalog_version, release, FakeCatalog};

    async fn resolve(catalog: &FakeCatalog, artifacts: &[Artifact]) -> Resolution {
        ResolutionEngine::new(catalog, 4).resolve(artifacts).await
    }

    fn outcome_of<'r>(results: &'r [UpdateResolution], digest: &str) -> &'r UpdateOutcome {
        &results
            .iter()
            .find(|r| r.source.digest == digest)
            .unwrap()
            .outcome
    }

    #[tokio::test]
    async fn bulk_absent_digest_has_no_compatible_version() {
        let catalog = FakeCatalog::default()
            .with_identity("d1", catalog_version("v1", "p1", &["1.21"]))
            .with_identity("d2", catalog_version("v2", "p2", &["1.21"]))
            .with_identity("d3", catalog_version("v3", "p3", &["1.21"]))
            .with_bulk_update("d1", release("n1", "p1", "fabric", "1.21.1", "p1-new.jar"))
            .with_bulk_update("d2", release("n2", "p2", "fabric", "1.21.1", "p2-new.jar"));
        let artifacts = vec![artifact("a.jar", "d1"), artifact("b.jar", "d2"), artifact("c.jar", "d3")];
        let resolution = resolve(&catalog, &artifacts).await;

        let results = UpdateMatcher::new(&catalog, 4)
            .match_updates(&resolution, "1.21.1", LoaderType::Fabric, MatchStrategy::Bulk)
            .await;

        assert_eq!(results.len(), 3);
        assert!(matches!(outcome_of(&results, "d1"), UpdateOutcome::Resolved(f) if f.filename == "p1-new.jar"));
        assert!(matches!(outcome_of(&results, "d2"), UpdateOutcome::Resolved(_)));
        assert_eq!(outcome_of(&results, "d3"), &UpdateOutcome::NoCompatibleVersion);
        assert_eq!(catalog.bulk_calls(), 1);
    }

    #[tokio::test]
    async fn unmatched_artifacts_report_no_identity() {
        let catalog = FakeCatalog::default()
            .with_identity("d1", catalog_version("v1", "p1", &["1.21"]))
            .with_bulk_update("d1", release("n1", "p1", "fabric", "1.21.1", "p1-new.jar"));
        let artifacts = vec![artifact("a.jar", "d1"), artifact("manual.jar", "dx")];
        let resolution = resolve(&catalog, &artifacts).await;

        let results = UpdateMatcher::new(&catalog, 4)
            .match_updates(&resolution, "1.21.1", LoaderType::Fabric, MatchStrategy::Bulk)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(outcome_of(&results, "dx"), &UpdateOutcome::NoIdentity);
        assert!(results.iter().find(|r| r.source.digest == "dx").unwrap().resolved_file().is_none());
    }

    #[tokio::test]
    async fn per_project_takes_first_compatible_entry() {
        let catalog = FakeCatalog::default()
            .with_identity("d1", catalog_version("v1", "p1", &["1.21"]))
            .with_project_versions(
                "p1",
                vec![
                    release("snap", "p1", "fabric", "24w33a", "snap.jar"),
                    release("forge", "p1", "forge", "1.21.1", "forge.jar"),
                    release("newest", "p1", "fabric", "1.21.1", "newest.jar"),
                    release("older", "p1", "fabric", "1.21.1", "older.jar"),
                ],
            );
        let resolution = resolve(&catalog, &[artifact("a.jar", "d1")]).await;

        let results = UpdateMatcher::new(&catalog, 4)
            .match_updates(&resolution, "1.21.1", LoaderType::Fabric, MatchStrategy::PerProject)
            .await;

        assert_eq!(results[0].resolved_file().unwrap().filename, "newest.jar");
    }

    #[tokio::test]
    async fn per_project_without_match_is_soft_failure() {
        let catalog = FakeCatalog::default()
            .with_identity("d1", catalog_version("v1", "p1", &["1.21"]))
            .with_project_versions("p1", vec![release("old", "p1", "fabric", "1.20.1", "old.jar")]);
        let resolution = resolve(&catalog, &[artifact("a.jar", "d1")]).await;

        let results = UpdateMatcher::new(&catalog, 4)
            .match_updates(&resolution, "1.21.1", LoaderType::Fabric, MatchStrategy::PerProject)
            .await;

        assert_eq!(results[0].outcome, UpdateOutcome::NoCompatibleVersion);
    }

    #[tokio::test]
    async fn failed_bulk_request_falls_back_to_projects() {
        let catalog = FakeCatalog::default()
            .with_identity("d1", catalog_version("v1", "p1", &["1.21"]))
            .with_failing_bulk()
            .with_project_versions("p1", vec![release("n1", "p1", "fabric", "1.21.1", "p1-new.jar")]);
        let resolution = resolve(&catalog, &[artifact("a.jar", "d1")]).await;

        let results = UpdateMatcher::new(&catalog, 4)
            .match_updates(&resolution, "1.21.1", LoaderType::Fabric, MatchStrategy::Bulk)
            .await;

        assert_eq!(results[0].resolved_file().unwrap().filename, "p1-new.jar");
    }

    #[test]
    fn version_without_files_is_not_a_match() {
        let mut version = release("n1", "p1", "fabric", "1.21.1", "x.jar");
        version.files.clear();
        assert_eq!(outcome_for(Some(&version)), UpdateOutcome::NoCompatibleVersion);
    }
}
