//! Tarball download and extraction.

use std::future::Future;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use burr_core::error::BurrError;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::tarball::{extract_tarball, NPM_WRAPPER_DEPTH};
use crate::InstallResult;

/// Fetches one package tarball and unpacks it into a directory
pub trait PackageFetcher: Send + Sync + 'static {
    /// Download `tarball_url` and extract it into `destination`
    ///
    /// `destination` is created if absent. Temporary download files are gone
    /// when the future completes, whatever the outcome.
    fn fetch_and_extract(
        &self,
        tarball_url: &str,
        destination: &Path,
    ) -> impl Future<Output = InstallResult<()>> + Send;
}

/// HTTP tarball fetcher
#[derive(Debug, Clone)]
pub struct HttpTarballFetcher {
    client: Client,
    upgrade_insecure: bool,
}

impl HttpTarballFetcher {
    pub fn new(timeout: Duration, upgrade_insecure: bool) -> InstallResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("burr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BurrError::network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self {
            client,
            upgrade_insecure,
        })
    }

    /// The URL actually requested, `http:` rewritten to `https:` when enabled
    pub fn effective_url(&self, tarball_url: &str) -> String {
        match tarball_url.strip_prefix("http:") {
            Some(rest) if self.upgrade_insecure => format!("https:{}", rest),
            _ => tarball_url.to_string(),
        }
    }

    /// Stream the tarball into `file`
    async fn download(&self, url: &str, file: &mut tokio::fs::File) -> InstallResult<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BurrError::network(format!("Failed to download tarball: {}", e), e))?;

        if !response.status().is_success() {
            return Err(BurrError::Network {
                message: format!("Failed to download {}: {}", url, response.status()),
                source: None,
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BurrError::network(format!("Failed to read tarball: {}", e), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| BurrError::io("Failed to write tarball".to_string(), e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| BurrError::io("Failed to write tarball".to_string(), e))?;

        Ok(written)
    }
}

impl PackageFetcher for HttpTarballFetcher {
    fn fetch_and_extract(
        &self,
        tarball_url: &str,
        destination: &Path,
    ) -> impl Future<Output = InstallResult<()>> + Send {
        let url = self.effective_url(tarball_url);
        let destination = destination.to_path_buf();

        async move {
            let parent = destination
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            tokio::fs::create_dir_all(&parent)
                .await
                .map_err(|e| BurrError::io(format!("Failed to create {}", parent.display()), e))?;

            // removed on drop, so every early return below cleans up
            let download = tempfile::Builder::new()
                .prefix(".burr-download-")
                .suffix(".tgz")
                .tempfile_in(&parent)
                .map_err(|e| BurrError::io("Failed to create temporary file".to_string(), e))?;

            let writer = download
                .reopen()
                .map_err(|e| BurrError::io("Failed to open temporary file".to_string(), e))?;
            let mut writer = tokio::fs::File::from_std(writer);
            let bytes = self.download(&url, &mut writer).await?;
            drop(writer);
            debug!(url = %url, bytes, "downloaded tarball");

            tokio::task::spawn_blocking(move || {
                let result = download
                    .reopen()
                    .map_err(|e| BurrError::io("Failed to open temporary file".to_string(), e))
                    .and_then(|file| {
                        extract_tarball(BufReader::new(file), &destination, NPM_WRAPPER_DEPTH)
                    });
                if let Err(e) = download.close() {
                    warn!("Failed to remove temporary download: {}", e);
                }
                result
            })
            .await
            .map_err(|e| {
                BurrError::io("Extraction task failed".to_string(), std::io::Error::other(e))
            })?
        }
    }
}

#[cfg(test)]
mod tests;
