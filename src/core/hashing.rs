// ─── Content Identifier ───
// SHA-1 digests of local mod files, streamed in fixed-size chunks.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::core::error::{UpdaterError, UpdaterResult};

/// Read size for hashing and download buffering.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// File extension of mod artifacts.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// A local mod file and its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub path: PathBuf,
    /// Lowercase hex SHA-1 of the file contents.
    pub digest: String,
}

/// Hash everything `reader` yields, `CHUNK_SIZE` bytes at a time.
pub async fn digest_reader<R>(mut reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-1 of a file on disk.
pub async fn digest_file(path: &Path) -> UpdaterResult<String> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| UpdaterError::io(path, e))?;
    digest_reader(file)
        .await
        .map_err(|e| UpdaterError::io(path, e))
}

/// Create the mods directory if it does not exist yet.
pub async fn ensure_dir(path: &Path) -> UpdaterResult<()> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("Path exists: {:?}", path);
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| UpdaterError::io(path, e))?;
    info!("Created path: {:?}", path);
    Ok(())
}

fn is_artifact(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
        .unwrap_or(false)
}

/// List the `.jar` files directly inside `dir`, sorted by filename.
pub async fn list_artifact_paths(dir: &Path) -> UpdaterResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| UpdaterError::io(dir, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| UpdaterError::io(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| UpdaterError::io(&path, e))?;
        if file_type.is_file() && is_artifact(&path) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Enumerate and hash every artifact in `dir`.
///
/// Any unreadable file fails the whole scan: the artifact set is a
/// precondition of the run, not something to retry per file.
pub async fn scan_artifacts(dir: &Path) -> UpdaterResult<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for path in list_artifact_paths(dir).await? {
        let digest = digest_file(&path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!("{} -> {}", filename, digest);
        artifacts.push(Artifact {
            filename,
            path,
            digest,
        });
    }

    debug!("Current mods: {}", artifacts.len());
    Ok(artifacts)
}
