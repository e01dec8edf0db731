// ─── Resolution Engine ───
// Maps local artifacts to catalog projects and infers the game version the
// current mod set was built for.

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::core::catalog::{CatalogClient, CatalogIdentity, CatalogVersion};
use crate::core::hashing::Artifact;

/// An artifact the catalog recognised.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub artifact: Artifact,
    pub identity: CatalogIdentity,
    /// The catalog version the local file belongs to.
    pub current: CatalogVersion,
}

/// Outcome of resolving a batch of artifacts.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Recognised artifacts, in input order.
    pub resolved: Vec<ResolvedArtifact>,
    /// Artifacts with no catalog match.
    pub unmatched: Vec<Artifact>,
    /// Last supported game version of the first recognised artifact.
    /// `None` when nothing resolved; archiving is skipped in that case.
    pub prior_version: Option<String>,
}

impl Resolution {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.unmatched.len()
    }
}

pub struct ResolutionEngine<'a> {
    catalog: &'a dyn CatalogClient,
    concurrency: usize,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(catalog: &'a dyn CatalogClient, concurrency: usize) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
        }
    }

    async fn identify(&self, artifact: &Artifact) -> Option<(CatalogVersion, CatalogIdentity)> {
        debug!("Getting mod from hash: {}", artifact.digest);
        let version = self.catalog.identify_by_digest(&artifact.digest).await?;

        let identity = match self.catalog.fetch_project_detail(&version.project_id).await {
            Some(identity) => identity,
            None => {
                warn!(
                    "Project {} details unavailable, continuing with its id only",
                    version.project_id
                );
                CatalogIdentity::from_project_id(&version.project_id)
            }
        };

        Some((version, identity))
    }

    /// Look up every artifact. Unmatched artifacts are soft failures: they are
    /// reported and skipped, never fatal.
    ///
    /// Lookups run concurrently but results are consumed in input order, so
    /// the first recognised artifact always decides `prior_version`.
    pub async fn resolve(&self, artifacts: &[Artifact]) -> Resolution {
        info!("Finding mods...");

        let lookups: Vec<_> = stream::iter(artifacts.iter())
            .map(|artifact| async move { (artifact, self.identify(artifact).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut resolution = Resolution::default();
        let mut seen_projects = HashSet::new();

        for (artifact, lookup) in lookups {
            let Some((current, identity)) = lookup else {
                warn!("No catalog match for {} ({})", artifact.filename, artifact.digest);
                resolution.unmatched.push(artifact.clone());
                continue;
            };

            if resolution.prior_version.is_none() {
                if let Some(candidate) = current.last_game_version().filter(|v| !v.is_empty()) {
                    debug!("Prior game version inferred from {}: {}", artifact.filename, candidate);
                    resolution.prior_version = Some(candidate.to_string());
                }
            }

            if !seen_projects.insert(identity.id.clone()) {
                warn!(
                    "{} belongs to project {} which another file already matched",
                    artifact.filename, identity.title
                );
            }

            info!("Found: {}", identity.title);
            resolution.resolved.push(ResolvedArtifact {
                artifact: artifact.clone(),
                identity,
                current,
            });
        }

        info!("Found {} mods.", resolution.resolved.len());
        resolution
    }
}
