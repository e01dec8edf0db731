use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::hashing::CHUNK_SIZE;

/// Suffix of files still being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Fetches a remote file to a local path. Returns the number of bytes written.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch_to(&self, url: &str, dest: &Path) -> UpdaterResult<u64>;
}

/// A single file to download.
#[derive(Debug, Clone)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
}

/// Reject remote file names that would escape the destination directory.
pub fn validate_file_name(name: &str) -> UpdaterResult<&str> {
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().map(|n| n == name).unwrap_or(false);
    if is_plain {
        Ok(name)
    } else {
        Err(UpdaterError::InvalidFileName(name.to_string()))
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

/// Removes the partial file on drop unless the download was committed.
/// Covers errors and futures dropped by cancellation alike.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Streaming HTTP downloader.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Stream `url` into `dest` through a `.part` file, renamed into place
    /// only after the last chunk is flushed.
    pub async fn download_file(&self, url: &str, dest: &Path) -> UpdaterResult<u64> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut partial = PartialFile {
            path: partial_path(dest),
            committed: false,
        };

        let written = {
            let file = tokio::fs::File::create(&partial.path)
                .await
                .map_err(|e| UpdaterError::io(&partial.path, e))?;
            let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
            let mut written = 0u64;

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(|e| UpdaterError::io(&partial.path, e))?;
                written += chunk.len() as u64;
            }

            writer
                .flush()
                .await
                .map_err(|e| UpdaterError::io(&partial.path, e))?;
            // file handle is dropped here, before the rename
            written
        };

        tokio::fs::rename(&partial.path, dest)
            .await
            .map_err(|e| UpdaterError::io(dest, e))?;
        partial.committed = true;

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }
}

#[async_trait]
impl FileFetcher for Downloader {
    async fn fetch_to(&self, url: &str, dest: &Path) -> UpdaterResult<u64> {
        self.download_file(url, dest).await
    }
}

/// Download many files concurrently using `buffer_unordered`.
///
/// Every entry gets a result; completion order is not preserved.
pub async fn download_batch(
    fetcher: &dyn FileFetcher,
    entries: Vec<DownloadEntry>,
    concurrency: usize,
) -> Vec<(DownloadEntry, UpdaterResult<u64>)> {
    info!(
        "Starting batch download: {} files, concurrency={}",
        entries.len(),
        concurrency
    );

    stream::iter(entries)
        .map(|entry| async move {
            let result = fetcher.fetch_to(&entry.url, &entry.dest).await;
            (entry, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}
