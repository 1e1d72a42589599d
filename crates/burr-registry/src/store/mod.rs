//! Session-scoped metadata store.
//!
//! Each package document is fetched at most once per session. Concurrent first
//! requests for the same name share a single in-flight fetch; a failed fetch
//! leaves the slot empty so a later request can try again.

use std::sync::Arc;

use burr_core::error::BurrError;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::metadata::RegistryMetadata;
use crate::provider::MetadataProvider;
use crate::RegistryResult;

type Slot = Arc<OnceCell<Arc<RegistryMetadata>>>;

/// Memoizing front for a `MetadataProvider`
#[derive(Debug)]
pub struct MetadataStore<P> {
    provider: P,
    entries: DashMap<String, Slot>,
}

impl<P: MetadataProvider> MetadataStore<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Cached metadata for `name`, fetching it on first use
    ///
    /// Any provider failure surfaces as `MetadataUnavailable`.
    pub async fn fetch(&self, name: &str) -> RegistryResult<Arc<RegistryMetadata>> {
        let slot = self.entries.entry(name.to_string()).or_default().clone();

        let metadata = slot
            .get_or_try_init(|| async {
                debug!(package = name, "fetching registry metadata");
                self.provider.fetch(name).await.map(Arc::new)
            })
            .await
            .map_err(|source| BurrError::MetadataUnavailable {
                name: name.to_string(),
                source: Box::new(source),
            })?;

        Ok(Arc::clone(metadata))
    }

    /// Metadata for `name` if it has already been fetched
    pub fn cached(&self, name: &str) -> Option<Arc<RegistryMetadata>> {
        self.entries
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    /// Every fetched document, ordered by package name
    pub fn snapshot(&self) -> Vec<Arc<RegistryMetadata>> {
        let mut documents: Vec<_> = self
            .entries
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect();
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        documents
    }

    /// Number of fetched documents
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
