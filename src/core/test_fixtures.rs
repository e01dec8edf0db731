//! In-memory stand-ins for the catalog and the file fetcher, shared by unit tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::core::catalog::{
    CatalogClient, CatalogIdentity, CatalogVersion, GameVersionTag, VersionFile, VersionKind,
};
use crate::core::downloader::FileFetcher;
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::hashing::Artifact;
use crate::core::loader::LoaderType;

pub fn artifact(filename: &str, digest: &str) -> Artifact {
    Artifact {
        filename: filename.to_string(),
        path: PathBuf::from("mods").join(filename),
        digest: digest.to_string(),
    }
}

/// Version of `project_id` supporting `game_versions` on fabric.
pub fn catalog_version(id: &str, project_id: &str, game_versions: &[&str]) -> CatalogVersion {
    CatalogVersion {
        id: id.to_string(),
        project_id: project_id.to_string(),
        name: id.to_string(),
        version_number: id.to_string(),
        game_versions: game_versions.iter().map(|v| v.to_string()).collect(),
        loaders: vec!["fabric".to_string()],
        files: vec![VersionFile {
            url: format!("https://cdn.example/{}/{}.jar", project_id, id),
            filename: format!("{}.jar", id),
            primary: true,
        }],
    }
}

/// Version with a single file named `filename`.
pub fn release(
    id: &str,
    project_id: &str,
    loader: &str,
    game_version: &str,
    filename: &str,
) -> CatalogVersion {
    CatalogVersion {
        id: id.to_string(),
        project_id: project_id.to_string(),
        name: id.to_string(),
        version_number: id.to_string(),
        game_versions: vec![game_version.to_string()],
        loaders: vec![loader.to_string()],
        files: vec![VersionFile {
            url: format!("https://cdn.example/{}/{}", project_id, filename),
            filename: filename.to_string(),
            primary: true,
        }],
    }
}

pub fn tag(version: &str, kind: VersionKind) -> GameVersionTag {
    GameVersionTag {
        version: version.to_string(),
        kind,
        release_date: Utc.with_ymd_and_hms(2024, 8, 8, 0, 0, 0).unwrap(),
        is_major: false,
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    game_versions: Vec<GameVersionTag>,
    identities: HashMap<String, CatalogVersion>,
    missing_projects: HashSet<String>,
    bulk: HashMap<String, CatalogVersion>,
    bulk_fails: bool,
    project_versions: HashMap<String, Vec<CatalogVersion>>,
    bulk_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_game_versions(mut self, tags: Vec<GameVersionTag>) -> Self {
        self.game_versions = tags;
        self
    }

    pub fn with_identity(mut self, digest: &str, version: CatalogVersion) -> Self {
        self.identities.insert(digest.to_string(), version);
        self
    }

    pub fn without_project(mut self, project_id: &str) -> Self {
        self.missing_projects.insert(project_id.to_string());
        self
    }

    pub fn with_bulk_update(mut self, digest: &str, version: CatalogVersion) -> Self {
        self.bulk.insert(digest.to_string(), version);
        self
    }

    pub fn with_failing_bulk(mut self) -> Self {
        self.bulk_fails = true;
        self
    }

    pub fn with_project_versions(mut self, project_id: &str, versions: Vec<CatalogVersion>) -> Self {
        self.project_versions.insert(project_id.to_string(), versions);
        self
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn fetch_game_versions(&self) -> UpdaterResult<Vec<GameVersionTag>> {
        if self.game_versions.is_empty() {
            return Err(UpdaterError::CatalogUnavailable("empty game version list".into()));
        }
        Ok(self.game_versions.clone())
    }

    async fn identify_by_digest(&self, digest: &str) -> Option<CatalogVersion> {
        self.identities.get(digest).cloned()
    }

    async fn resolve_bulk_update(
        &self,
        digests: &[String],
        _loader: LoaderType,
        _game_version: &str,
    ) -> Option<HashMap<String, CatalogVersion>> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if self.bulk_fails {
            return None;
        }
        Some(
            digests
                .iter()
                .filter_map(|d| self.bulk.get(d).map(|v| (d.clone(), v.clone())))
                .collect(),
        )
    }

    async fn fetch_project_detail(&self, project_id: &str) -> Option<CatalogIdentity> {
        if self.missing_projects.contains(project_id) {
            return None;
        }
        Some(CatalogIdentity {
            id: project_id.to_string(),
            slug: project_id.to_string(),
            title: format!("Project {}", project_id),
            description: String::new(),
            loaders: BTreeSet::from(["fabric".to_string()]),
            version_ids: Vec::new(),
            compatible_game_versions: Vec::new(),
        })
    }

    async fn fetch_project_versions(&self, project_id: &str) -> Option<Vec<CatalogVersion>> {
        self.project_versions.get(project_id).cloned()
    }
}

/// Fetcher that serves bodies from memory; unknown URLs fail with HTTP 404.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeFetcher {
    pub fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    /// Every download stalls this long before writing anything.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FileFetcher for FakeFetcher {
    async fn fetch_to(&self, url: &str, dest: &Path) -> UpdaterResult<u64> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        let body = self.bodies.get(url).ok_or_else(|| UpdaterError::HttpStatus {
            url: url.to_string(),
            status: 404,
        })?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tokio::fs::write(dest, body)
            .await
            .map_err(|e| UpdaterError::io(dest, e))?;
        Ok(body.len() as u64)
    }
}
