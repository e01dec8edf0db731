//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::core::config::{MatchStrategy, Settings, UpdaterConfig, VersionRequest};
use crate::core::error::UpdaterResult;
use crate::core::loader::LoaderType;

/// Update mods from Modrinth.
#[derive(Parser, Debug)]
#[command(name = "mod-updater", about = "Update mods from Modrinth.")]
pub struct Cli {
    /// Path where to update mods
    #[arg(short = 'p', long, default_value = "./mods/")]
    pub path: PathBuf,

    /// Game version to update to, e.g. 1.21.1
    #[arg(short = 'v', long, default_value = "latest")]
    pub version: String,

    /// Mod loader the updates must support
    #[arg(short = 'l', long, value_enum, default_value_t = LoaderType::Fabric)]
    pub loader: LoaderType,

    /// How updates are looked up
    #[arg(long, value_enum, default_value_t = MatchStrategy::Bulk)]
    pub strategy: MatchStrategy,

    /// Parallel requests (overrides settings)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Report what would be updated without moving or downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log file, rewritten on every run
    #[arg(long, value_name = "FILE", default_value = "mod_updater.log")]
    pub log_file: PathBuf,

    /// Show debug output on the console
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Merge settings and arguments into the run configuration.
    pub fn into_config(self) -> UpdaterResult<UpdaterConfig> {
        let settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load_default(),
        };

        let mut config = UpdaterConfig::new(settings, self.path);
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        config.version = VersionRequest::parse(&self.version);
        config.loader = self.loader;
        config.strategy = self.strategy;
        config.run_timeout = self.timeout.map(std::time::Duration::from_secs);
        config.dry_run = self.dry_run;
        Ok(config)
    }
}
