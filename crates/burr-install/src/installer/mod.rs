//! Concurrent installation of a resolved package set
//!
//! Every package is fetched in its own task, bounded by a semaphore. The first
//! failure is returned; sibling tasks already dispatched are detached and left
//! to finish on their own.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use burr_core::error::BurrError;
use burr_core::utils::path::safe_join;
use burr_core::{validate_name, ResolvedPackage};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::fetcher::PackageFetcher;
use crate::InstallResult;

pub const DEFAULT_CONCURRENCY: usize = 16;

/// Outcome of a successful install
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Installed packages, by name
    pub installed: Vec<ResolvedPackage>,
    pub root: PathBuf,
    pub elapsed_ms: u64,
}

/// Installs packages into `<root>/<name>`
#[derive(Debug)]
pub struct Installer<F> {
    fetcher: Arc<F>,
    root: PathBuf,
    max_concurrency: usize,
}

impl<F: PackageFetcher> Installer<F> {
    pub fn new(fetcher: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            root: root.into(),
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Limit simultaneous downloads; at least one always runs
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a package is unpacked into, always a direct child of the root
    pub fn destination_for(&self, name: &str) -> InstallResult<PathBuf> {
        validate_name(name).map_err(|_| BurrError::UnsafeArchivePath {
            path: name.to_string(),
        })?;
        safe_join(&self.root, Path::new(name))
    }

    /// Fetch and extract every package
    pub async fn install(&self, packages: &[ResolvedPackage]) -> InstallResult<InstallReport> {
        let start_time = Instant::now();

        // every destination is checked before the first download starts
        let mut planned = Vec::with_capacity(packages.len());
        for package in packages {
            let destination = self.destination_for(&package.name).map_err(|source| {
                BurrError::InstallFailure {
                    name: package.name.clone(),
                    version: package.version.to_string(),
                    source: Box::new(source),
                }
            })?;
            planned.push((package, destination));
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BurrError::io(format!("Failed to create {}", self.root.display()), e))?;

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (package, destination) in planned {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let package = package.clone();

            tasks.spawn(async move {
                let failure = |source: BurrError| BurrError::InstallFailure {
                    name: package.name.clone(),
                    version: package.version.to_string(),
                    source: Box::new(source),
                };

                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    failure(BurrError::io(
                        "Install queue closed".to_string(),
                        std::io::Error::other(e),
                    ))
                })?;

                debug!(package = %package, url = %package.tarball_url, "installing");
                fetcher
                    .fetch_and_extract(&package.tarball_url, &destination)
                    .await
                    .map_err(failure)?;

                Ok::<_, BurrError>(package)
            });
        }

        let mut installed = Vec::with_capacity(packages.len());
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(BurrError::io(
                    "Install task failed".to_string(),
                    std::io::Error::other(e),
                ))
            });

            match outcome {
                Ok(package) => {
                    info!("installed {}", package);
                    installed.push(package);
                },
                Err(error) => {
                    // dropping the set would abort the siblings
                    tasks.detach_all();
                    return Err(error);
                },
            }
        }

        installed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(InstallReport {
            installed,
            root: self.root.clone(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}
