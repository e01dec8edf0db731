pub mod client;

pub use client::{download_batch, validate_file_name, DownloadEntry, Downloader, FileFetcher};
