use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::loader::LoaderType;

const APP_DIR_NAME: &str = "mod-updater";
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_API_BASE_URL: &str = "https://api.modrinth.com/v2";
pub const DEFAULT_USER_AGENT: &str = concat!("mod-updater/", env!("CARGO_PKG_VERSION"));
const MAX_CONCURRENCY: usize = 16;

/// Persistent settings, read from `settings.json`. Every field is optional on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub user_agent: String,
    /// Parallel catalog requests and downloads.
    pub concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 6,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from an explicit file. A missing or malformed file is an error.
    pub fn load_from(path: &Path) -> UpdaterResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| UpdaterError::io(path, e))?;
        let settings: Settings = serde_json::from_str(&raw)
            .map_err(|e| UpdaterError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(settings.normalized())
    }

    /// Load settings from the per-user config directory, falling back to defaults.
    pub fn load_default() -> Self {
        let Some(path) = default_settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Ignoring unreadable settings file: {}", e);
                Self::default()
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        self.concurrency = self.concurrency.clamp(1, MAX_CONCURRENCY);
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self
    }
}

fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_DIR_NAME).join(SETTINGS_FILE))
}

/// Which Update Matcher strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatchStrategy {
    /// One bulk request for the whole batch, per-project lookup if it fails.
    #[default]
    Bulk,
    /// Fetch each project's version list and filter locally.
    PerProject,
}

/// Requested target game version before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    Latest,
    Exact(String),
}

impl VersionRequest {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            VersionRequest::Latest
        } else {
            VersionRequest::Exact(trimmed.to_string())
        }
    }
}

impl std::fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionRequest::Latest => f.write_str("latest"),
            VersionRequest::Exact(v) => f.write_str(v),
        }
    }
}

/// Fully resolved run configuration: settings merged with command-line arguments.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub settings: Settings,
    pub mods_dir: PathBuf,
    pub version: VersionRequest,
    pub loader: LoaderType,
    pub strategy: MatchStrategy,
    /// Whole-run deadline; `None` runs until done or interrupted.
    pub run_timeout: Option<Duration>,
    /// Identify and match only; leave the mods directory untouched.
    pub dry_run: bool,
}

impl UpdaterConfig {
    pub fn new(settings: Settings, mods_dir: PathBuf) -> Self {
        Self {
            settings: settings.normalized(),
            mods_dir,
            version: VersionRequest::Latest,
            loader: LoaderType::Fabric,
            strategy: MatchStrategy::default(),
            run_timeout: None,
            dry_run: false,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.settings.concurrency = n.clamp(1, MAX_CONCURRENCY);
        self
    }
}
