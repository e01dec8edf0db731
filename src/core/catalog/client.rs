use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::model::{CatalogIdentity, CatalogVersion, GameVersionTag};
use crate::core::config::Settings;
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::build_http_client;
use crate::core::loader::LoaderType;

const HASH_ALGORITHM: &str = "sha1";

/// Remote lookups the resolution engine depends on.
///
/// Only `fetch_game_versions` can fail outright. Every other lookup degrades
/// to `None` on transport or protocol failure so callers can skip the one
/// artifact instead of aborting the batch.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// All known game versions, newest first. An empty list is an error.
    async fn fetch_game_versions(&self) -> UpdaterResult<Vec<GameVersionTag>>;

    /// Version that contains a file with this SHA-1.
    async fn identify_by_digest(&self, digest: &str) -> Option<CatalogVersion>;

    /// Latest version per digest compatible with `loader` and `game_version`.
    /// Digests missing from the map have no compatible update.
    /// `None` means the request itself failed.
    async fn resolve_bulk_update(
        &self,
        digests: &[String],
        loader: LoaderType,
        game_version: &str,
    ) -> Option<HashMap<String, CatalogVersion>>;

    async fn fetch_project_detail(&self, project_id: &str) -> Option<CatalogIdentity>;

    /// Every version of a project, newest first.
    async fn fetch_project_versions(&self, project_id: &str) -> Option<Vec<CatalogVersion>>;
}

#[derive(Serialize)]
struct HashesBody<'a> {
    hashes: &'a [String],
    algorithm: &'static str,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    hashes: &'a [String],
    algorithm: &'static str,
    loaders: [&'a str; 1],
    game_versions: [&'a str; 1],
}

/// `CatalogClient` backed by the Modrinth v2 REST API.
#[derive(Clone)]
pub struct ModrinthClient {
    client: Client,
    base_url: String,
}

impl ModrinthClient {
    pub fn new(settings: &Settings) -> UpdaterResult<Self> {
        let client = build_http_client(settings)?;
        Ok(Self::with_client(client, &settings.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The underlying HTTP client, shared with the downloader.
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Ok(None)` on 404; any other non-success status is an error.
    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> UpdaterResult<Option<T>> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UpdaterError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> UpdaterResult<Option<T>> {
        let url = self.url(path);
        let response = self.client.get(&url).send().await?;
        Self::decode(&url, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> UpdaterResult<Option<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(&url, response).await
    }
}

/// Collapse a lookup result into the `None` sentinel, logging not-found and
/// failure differently.
fn degrade<T>(what: &str, result: UpdaterResult<Option<T>>) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            debug!("Not found in catalog: {}", what);
            None
        }
        Err(e) => {
            warn!("Catalog lookup failed for {}: {}", what, e);
            None
        }
    }
}

#[async_trait]
impl CatalogClient for ModrinthClient {
    async fn fetch_game_versions(&self) -> UpdaterResult<Vec<GameVersionTag>> {
        info!("Fetching game version tags...");

        let tags: Vec<GameVersionTag> = self
            .get_json("/tag/game_version")
            .await?
            .ok_or_else(|| UpdaterError::CatalogUnavailable("game version tags not found".into()))?;

        if tags.is_empty() {
            return Err(UpdaterError::CatalogUnavailable(
                "empty game version list".into(),
            ));
        }

        info!("Loaded {} game versions", tags.len());
        Ok(tags)
    }

    async fn identify_by_digest(&self, digest: &str) -> Option<CatalogVersion> {
        let hashes = [digest.to_string()];
        let body = HashesBody {
            hashes: &hashes,
            algorithm: HASH_ALGORITHM,
        };
        let found: Option<HashMap<String, CatalogVersion>> =
            degrade(digest, self.post_json("/version_files", &body).await);

        // Modrinth answers an unknown hash with an empty object, not a 404.
        let version = found.and_then(|mut map| map.remove(digest));
        if version.is_none() {
            debug!("No catalog entry for hash {}", digest);
        }
        version
    }

    async fn resolve_bulk_update(
        &self,
        digests: &[String],
        loader: LoaderType,
        game_version: &str,
    ) -> Option<HashMap<String, CatalogVersion>> {
        if digests.is_empty() {
            return Some(HashMap::new());
        }

        let body = UpdateBody {
            hashes: digests,
            algorithm: HASH_ALGORITHM,
            loaders: [loader.as_str()],
            game_versions: [game_version],
        };
        let result: UpdaterResult<Option<HashMap<String, CatalogVersion>>> =
            self.post_json("/version_files/update", &body).await;

        match result {
            Ok(Some(map)) => Some(map),
            // A 404 here means none of the hashes have an update.
            Ok(None) => Some(HashMap::new()),
            Err(e) => {
                warn!("Bulk update lookup failed: {}", e);
                None
            }
        }
    }

    async fn fetch_project_detail(&self, project_id: &str) -> Option<CatalogIdentity> {
        let path = format!("/project/{}", project_id);
        degrade(project_id, self.get_json(&path).await)
    }

    async fn fetch_project_versions(&self, project_id: &str) -> Option<Vec<CatalogVersion>> {
        let path = format!("/project/{}/version", project_id);
        degrade(project_id, self.get_json(&path).await)
    }
}
