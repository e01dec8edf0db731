// ─── Archive ───
// Moves the current mod set into a folder named after the game version it
// was built for. Runs to completion before any download starts.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::downloader::validate_file_name;
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::hashing::{ensure_dir, Artifact};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub dir: PathBuf,
    pub moved: usize,
}

/// Archive directory for `prior_version` inside `mods_dir`.
///
/// `None` when there is no usable version label; a blank label must never
/// turn into a directory. Non-blank labels are used verbatim.
pub fn archive_dir(mods_dir: &Path, prior_version: Option<&str>) -> UpdaterResult<Option<PathBuf>> {
    let Some(version) = prior_version.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let label = validate_file_name(version)?;
    Ok(Some(mods_dir.join(label)))
}

/// Move every artifact into the prior-version folder.
///
/// Returns `Ok(None)` without touching the disk when no prior version is
/// known. Any failed move is returned as an error so the run stops before
/// new files are written. Files already in the archive are never replaced:
/// every target is checked before the first move.
pub async fn archive_artifacts(
    mods_dir: &Path,
    prior_version: Option<&str>,
    artifacts: &[Artifact],
) -> UpdaterResult<Option<ArchiveReport>> {
    let Some(dir) = archive_dir(mods_dir, prior_version)? else {
        info!("No prior game version known, leaving current mods in place.");
        return Ok(None);
    };

    ensure_dir(&dir).await?;

    for artifact in artifacts {
        let target = dir.join(&artifact.filename);
        let taken = tokio::fs::try_exists(&target)
            .await
            .map_err(|e| UpdaterError::io(&target, e))?;
        if taken {
            return Err(UpdaterError::ArchiveCollision(target));
        }
    }

    let mut moved = 0;
    for artifact in artifacts {
        let target = dir.join(&artifact.filename);
        tokio::fs::rename(&artifact.path, &target)
            .await
            .map_err(|e| UpdaterError::io(&artifact.path, e))?;
        debug!("Moved mod: {} to: {:?}", artifact.filename, dir);
        moved += 1;
    }

    info!("Moved {} current mods to {:?}.", moved, dir);
    Ok(Some(ArchiveReport { dir, moved }))
}
