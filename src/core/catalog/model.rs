// ─── Catalog Model ───
// Typed shapes of the Modrinth v2 payloads the updater consumes.
// Required fields are enforced by serde at the client boundary, so a
// payload that parses is safe to use without further lookups.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a game version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    Release,
    Snapshot,
    #[serde(other)]
    Other,
}

/// Entry of `GET /tag/game_version`, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameVersionTag {
    pub version: String,
    #[serde(rename = "version_type")]
    pub kind: VersionKind,
    #[serde(rename = "date")]
    pub release_date: DateTime<Utc>,
    #[serde(rename = "major")]
    pub is_major: bool,
}

/// Remote project record (`GET /project/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIdentity {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub loaders: BTreeSet<String>,
    #[serde(rename = "versions", default)]
    pub version_ids: Vec<String>,
    #[serde(rename = "game_versions", default)]
    pub compatible_game_versions: Vec<String>,
}

impl CatalogIdentity {
    /// Minimal identity for a project whose detail lookup failed.
    pub fn from_project_id(project_id: &str) -> Self {
        Self {
            id: project_id.to_string(),
            slug: project_id.to_string(),
            title: project_id.to_string(),
            description: String::new(),
            loaders: BTreeSet::new(),
            version_ids: Vec::new(),
            compatible_game_versions: Vec::new(),
        }
    }
}

/// One downloadable file of a catalog version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionFile {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub primary: bool,
}

/// A project version, as returned by the `version_files` endpoints and
/// `GET /project/{id}/version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

impl CatalogVersion {
    /// Last game version this build declares support for.
    pub fn last_game_version(&self) -> Option<&str> {
        self.game_versions.last().map(String::as_str)
    }

    /// First listed file; catalogs may attach several builds and the first wins.
    pub fn first_file(&self) -> Option<ResolvedFile> {
        self.files.first().map(|file| ResolvedFile {
            download_url: file.url.clone(),
            filename: file.filename.clone(),
        })
    }

    pub fn supports(&self, loader: &str, game_version: &str) -> bool {
        self.loaders.iter().any(|l| l == loader)
            && self.game_versions.iter().any(|v| v == game_version)
    }
}

/// The file chosen as an artifact's update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub download_url: String,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_game_version_tags() {
        let json = r#"[
            {"version": "1.21.2-rc1", "version_type": "snapshot", "date": "2024-10-15T12:00:00Z", "major": false},
            {"version": "1.21.1", "version_type": "release", "date": "2024-08-08T12:00:00Z", "major": false},
            {"version": "b1.7.3", "version_type": "beta", "date": "2011-07-08T00:00:00Z", "major": false}
        ]"#;
        let tags: Vec<GameVersionTag> = serde_json::from_str(json).unwrap();
        assert_eq!(tags[0].kind, VersionKind::Snapshot);
        assert_eq!(tags[1].kind, VersionKind::Release);
        assert_eq!(tags[2].kind, VersionKind::Other);
    }

    #[test]
    fn deserialize_project_detail() {
        let json = r#"{
            "id": "AANobbMI",
            "slug": "sodium",
            "title": "Sodium",
            "description": "Rendering engine",
            "loaders": ["fabric", "neoforge", "quilt"],
            "versions": ["a1", "b2"],
            "game_versions": ["1.20.1", "1.21.1"],
            "downloads": 1000
        }"#;
        let identity: CatalogIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.slug, "sodium");
        assert!(identity.loaders.contains("fabric"));
        assert_eq!(identity.version_ids, vec!["a1", "b2"]);
        assert_eq!(identity.compatible_game_versions.last().unwrap(), "1.21.1");
    }

    #[test]
    fn project_without_id_is_rejected() {
        let json = r#"{ "slug": "sodium", "title": "Sodium" }"#;
        assert!(serde_json::from_str::<CatalogIdentity>(json).is_err());
    }

    #[test]
    fn first_file_wins_over_primary_flag() {
        let json = r#"{
            "id": "v1",
            "project_id": "p1",
            "game_versions": ["1.21", "1.21.1"],
            "loaders": ["fabric"],
            "files": [
                {"url": "https://cdn.example/a.jar", "filename": "a.jar", "primary": false},
                {"url": "https://cdn.example/b.jar", "filename": "b.jar", "primary": true}
            ]
        }"#;
        let version: CatalogVersion = serde_json::from_str(json).unwrap();
        assert_eq!(version.first_file().unwrap().filename, "a.jar");
        assert_eq!(version.last_game_version(), Some("1.21.1"));
        assert!(version.supports("fabric", "1.21"));
        assert!(!version.supports("forge", "1.21"));
    }
}
