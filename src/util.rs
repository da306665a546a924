use std::path::{Path, PathBuf};

use tokio::{fs::File, io::AsyncWriteExt};

pub struct HttpClient {
    pub client: reqwest::Client,
}

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("transfer ended after {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },
}

/// State of one in-flight download.
#[derive(Debug, Clone)]
pub struct DownloadTransfer {
    pub url: String,
    pub destination: PathBuf,
    pub bytes_expected: Option<u64>,
    pub bytes_received: u64,
}

impl DownloadTransfer {
    fn part_path(&self) -> PathBuf {
        let mut name = self.destination.clone().into_os_string();
        name.push(".part");
        PathBuf::from(name)
    }
}

impl HttpClient {
    pub fn new() -> reqwest::Result<HttpClient> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpClient { client })
    }

    /// Stream `url` into `path`, calling `on_progress(received, total)` after
    /// every chunk. The body goes to a `.part` file first, so `path` either
    /// holds the complete resource or does not exist.
    pub async fn fetch<F>(&self, url: &str, path: &Path, on_progress: F) -> Result<u64, DownloadError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let mut transfer = DownloadTransfer {
            url: url.to_string(),
            destination: path.to_path_buf(),
            bytes_expected: None,
            bytes_received: 0,
        };
        let temp_path = transfer.part_path();

        let result = match self.fetch_into(&mut transfer, &temp_path, on_progress).await {
            Ok(()) => tokio::fs::rename(&temp_path, path)
                .await
                .map_err(DownloadError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                debug!("fetched {} ({} bytes)", transfer.url, transfer.bytes_received);
                Ok(transfer.bytes_received)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&temp_path).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("could not remove {}: {}", temp_path.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch_into<F>(
        &self,
        transfer: &mut DownloadTransfer,
        temp_path: &Path,
        mut on_progress: F,
    ) -> Result<(), DownloadError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let mut resp = self
            .client
            .get(&transfer.url)
            .send()
            .await?
            .error_for_status()?;
        transfer.bytes_expected = resp.content_length();

        let mut file = File::create(temp_path).await?;
        on_progress(0, transfer.bytes_expected);

        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            transfer.bytes_received += chunk.len() as u64;
            on_progress(transfer.bytes_received, transfer.bytes_expected);
        }

        file.flush().await?;
        file.sync_all().await?;

        match transfer.bytes_expected {
            Some(expected) if expected != transfer.bytes_received => Err(DownloadError::Truncated {
                received: transfer.bytes_received,
                expected,
            }),
            _ => Ok(()),
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    let mut bytes = bytes as f64;
    let mut suffix = "B";

    if bytes > 1024.0 {
        bytes /= 1024.0;
        suffix = "KiB";
    }
    if bytes > 1024.0 {
        bytes /= 1024.0;
        suffix = "MiB";
    }
    if bytes > 1024.0 {
        bytes /= 1024.0;
        suffix = "GiB";
    }
    if bytes > 1024.0 {
        bytes /= 1024.0;
        suffix = "TiB";
    }

    format!("{:.2} {}", bytes, suffix)
}
