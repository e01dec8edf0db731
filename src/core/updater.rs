// ─── Update Run ───
// Validate target → hash local mods → resolve → match → archive → fetch.
// Archiving always finishes before the first download begins.

use std::collections::HashSet;
use std::fmt;
use std::future::{self, Future};
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::core::archive::archive_artifacts;
use crate::core::catalog::CatalogClient;
use crate::core::config::UpdaterConfig;
use crate::core::downloader::{download_batch, validate_file_name, DownloadEntry, FileFetcher};
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::hashing::{ensure_dir, scan_artifacts};
use crate::core::matcher::{UpdateMatcher, UpdateResolution};
use crate::core::resolver::ResolutionEngine;
use crate::core::version::VersionGate;

/// Download tally of the fetch step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// `(file name, reason)` for every failed download.
    pub failures: Vec<(String, String)>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub target_version: String,
    pub prior_version: Option<String>,
    pub total: usize,
    pub identified: usize,
    pub resolved: usize,
    pub archived: usize,
    pub attempted: usize,
    pub downloaded: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mods: {} found, {} with updates for {}, {}/{} downloaded",
            self.total,
            self.identified,
            self.resolved,
            self.target_version,
            self.downloaded,
            self.attempted
        )
    }
}

/// What the fetch step may do with a destination that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingFiles {
    /// The old set was archived; anything left under that name may go.
    Replace,
    /// Nothing was archived; an existing file is kept and the download fails.
    Keep,
}

/// Download every resolved file into `mods_dir`.
///
/// Failures are recorded per file; a bad remote file name counts as a
/// failed attempt without touching the disk. Several artifacts resolving to
/// the same file name are fetched once, for the first of them.
pub async fn fetch_updates(
    fetcher: &dyn FileFetcher,
    mods_dir: &Path,
    resolutions: &[UpdateResolution],
    concurrency: usize,
    existing: ExistingFiles,
) -> FetchReport {
    let mut report = FetchReport::default();
    let mut entries = Vec::new();
    let mut destinations = HashSet::new();

    for resolution in resolutions {
        let Some(file) = resolution.resolved_file() else {
            continue;
        };
        if !destinations.insert(file.filename.clone()) {
            warn!(
                "{} resolves to {} which is already queued, skipping",
                resolution.source.filename, file.filename
            );
            continue;
        }

        report.attempted += 1;
        let dest = match validate_file_name(&file.filename) {
            Ok(name) => mods_dir.join(name),
            Err(e) => {
                warn!("Not downloading {}: {}", file.download_url, e);
                report.failures.push((file.filename.clone(), e.to_string()));
                continue;
            }
        };

        if existing == ExistingFiles::Keep && tokio::fs::try_exists(&dest).await.unwrap_or(true) {
            let e = UpdaterError::WouldOverwrite(dest);
            warn!("Not downloading {}: {}", file.filename, e);
            report.failures.push((file.filename.clone(), e.to_string()));
            continue;
        }

        entries.push(DownloadEntry {
            url: file.download_url.clone(),
            dest,
        });
    }

    for (entry, result) in download_batch(fetcher, entries, concurrency).await {
        let name = entry
            .dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match result {
            Ok(_) => {
                info!("Downloaded: {}", name);
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("Download of {} failed: {}", name, e);
                report.failures.push((name, e.to_string()));
            }
        }
    }

    report
}

/// Resolves once `signal` fires. A signal source that cannot be set up
/// never fires instead of cancelling the run.
pub async fn interrupt_signal<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Cannot listen for interrupts ({}), running without them.", e);
        future::pending::<()>().await;
    }
}

/// Drive `work` until it finishes, `timeout` elapses or `interrupt` fires.
///
/// Losing the race drops `work` with whatever it had in flight; downloads
/// clean up their partial files and completed archive moves stay put.
pub async fn with_deadline<T, W, S>(
    work: W,
    timeout: Option<Duration>,
    interrupt: S,
) -> UpdaterResult<T>
where
    W: Future<Output = UpdaterResult<T>>,
    S: Future<Output = ()>,
{
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = work => result,
        _ = interrupt => {
            warn!("Interrupted, abandoning remaining downloads.");
            Err(UpdaterError::Interrupted)
        }
        _ = deadline => {
            let secs = timeout.map(|t| t.as_secs()).unwrap_or_default();
            warn!("Run exceeded {}s, abandoning remaining downloads.", secs);
            Err(UpdaterError::TimedOut(secs))
        }
    }
}

/// One update run over a mods directory.
pub struct Updater<'a> {
    config: &'a UpdaterConfig,
    catalog: &'a dyn CatalogClient,
    fetcher: &'a dyn FileFetcher,
    gate: &'a VersionGate,
}

impl<'a> Updater<'a> {
    pub fn new(
        config: &'a UpdaterConfig,
        catalog: &'a dyn CatalogClient,
        fetcher: &'a dyn FileFetcher,
        gate: &'a VersionGate,
    ) -> Self {
        Self {
            config,
            catalog,
            fetcher,
            gate,
        }
    }

    pub async fn run(&self) -> UpdaterResult<RunSummary> {
        let config = self.config;
        let concurrency = config.settings.concurrency;

        // Rejection happens here, before anything on disk changes.
        let target = self.gate.validate(&config.version)?;
        info!(
            "Started with version: ({}) and path: ({})",
            target,
            config.mods_dir.display()
        );

        ensure_dir(&config.mods_dir).await?;
        let artifacts = scan_artifacts(&config.mods_dir).await?;

        let resolution = ResolutionEngine::new(self.catalog, concurrency)
            .resolve(&artifacts)
            .await;
        let resolutions = UpdateMatcher::new(self.catalog, concurrency)
            .match_updates(&resolution, &target, config.loader, config.strategy)
            .await;

        let mut summary = RunSummary {
            target_version: target,
            prior_version: resolution.prior_version.clone(),
            total: artifacts.len(),
            identified: resolution.resolved.len(),
            resolved: resolutions.iter().filter(|r| r.is_resolved()).count(),
            ..RunSummary::default()
        };

        if config.dry_run {
            for file in resolutions.iter().filter_map(UpdateResolution::resolved_file) {
                info!("Would download: {}", file.filename);
            }
            return Ok(summary);
        }

        let existing =
            match archive_artifacts(&config.mods_dir, resolution.prior_version.as_deref(), &artifacts)
                .await?
            {
                Some(report) => {
                    summary.archived = report.moved;
                    ExistingFiles::Replace
                }
                None => ExistingFiles::Keep,
            };

        let fetched = fetch_updates(
            self.fetcher,
            &config.mods_dir,
            &resolutions,
            concurrency,
            existing,
        )
        .await;
        summary.attempted = fetched.attempted;
        summary.downloaded = fetched.succeeded;

        Ok(summary)
    }
}
