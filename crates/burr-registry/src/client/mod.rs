//! HTTP registry client with connection pooling and retry logic

use std::future::Future;
use std::time::Duration;

use burr_core::error::BurrError;
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::api::PackageDocument;
use crate::metadata::RegistryMetadata;
use crate::provider::MetadataProvider;
use crate::RegistryResult;

/// Abbreviated metadata: versions, dependencies and dist only
const INSTALL_ACCEPT: &str = "application/vnd.npm.install-v1+json";

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Connection settings for a registry
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP client for the npm registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Base registry URL, without trailing slash
    base_url: String,
}

impl RegistryClient {
    /// Create a client for the public npm registry
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> RegistryResult<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| BurrError::ConfigValidation {
            field: "registry.url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BurrError::ConfigValidation {
                field: "registry.url".to_string(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }

        let client = ClientBuilder::new()
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(concat!("burr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BurrError::network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self {
            client,
            retry_config: config.retry,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Answers that will not change on a second ask
                    let permanent = matches!(
                        error,
                        BurrError::PackageNotFound { .. } | BurrError::RegistryParse { .. }
                    );
                    if permanent || attempt == self.retry_config.max_retries {
                        last_error = Some(error);
                        break;
                    }

                    debug!(attempt = attempt + 1, "registry request failed, retrying: {}", error);
                    last_error = Some(error);

                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
            }
        }

        Err(last_error.unwrap_or_else(|| BurrError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// Fetch the abbreviated package document with retry logic
    pub async fn fetch_document(&self, package_name: &str) -> RegistryResult<PackageDocument> {
        let url = format!("{}/{}", self.base_url, self.encode_package_name(package_name));
        debug!("GET {}", url);

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .header("Accept", INSTALL_ACCEPT)
                .send()
                .await
                .map_err(|e| BurrError::network(format!("Failed to fetch metadata: {}", e), e))?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.bytes().await.map_err(|e| {
                        BurrError::network(format!("Failed to read metadata: {}", e), e)
                    })?;
                    serde_json::from_slice::<PackageDocument>(&body).map_err(|e| {
                        BurrError::RegistryParse {
                            message: format!("{}: {}", package_name, e),
                        }
                    })
                },
                StatusCode::NOT_FOUND => Err(BurrError::PackageNotFound {
                    name: package_name.to_string(),
                }),
                status => Err(BurrError::Network {
                    message: format!("Registry returned status {}: {}", status, package_name),
                    source: None,
                }),
            }
        })
        .await
    }

    /// Encode package name for URL (scoped packages keep their `@`)
    fn encode_package_name(&self, name: &str) -> String {
        if name.starts_with('@') {
            name.replace('/', "%2f")
        } else {
            name.to_string()
        }
    }
}

impl MetadataProvider for RegistryClient {
    fn fetch(&self, name: &str) -> impl Future<Output = RegistryResult<RegistryMetadata>> + Send {
        async move {
            let document = self.fetch_document(name).await?;
            if document.name != name {
                warn!(requested = name, returned = %document.name, "registry returned a different package name");
            }
            Ok(RegistryMetadata::from_document(document))
        }
    }
}

#[cfg(test)]
mod tests;
