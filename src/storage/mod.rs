pub mod file;
pub mod memory;
pub mod traits;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::{Error, Result},
};
use std::collections::HashSet;
use std::sync::Arc;

pub use file::FileLinkStore;
pub use memory::MemoryLinkStore;
pub use traits::LinkStore;

/// Attempts before an update gives up on a store that keeps changing.
pub const MAX_UPDATE_ATTEMPTS: usize = 8;

/// Read/modify/write access to the persisted link list. Every write is a
/// versioned compare-and-swap, so overlapping writers retry instead of
/// overwriting each other.
#[derive(Clone)]
pub struct LinkRepository {
    backend: Arc<dyn LinkStore>,
}

impl LinkRepository {
    pub fn new(config: &StorageConfig) -> Self {
        let backend: Arc<dyn LinkStore> = match &config.backend {
            StorageBackend::File(path) => {
                log::debug!("Using link file {}", path.display());
                Arc::new(FileLinkStore::new(path.clone()))
            }
            StorageBackend::Memory => Arc::new(MemoryLinkStore::new()),
        };
        Self { backend }
    }

    pub fn from_store(backend: Arc<dyn LinkStore>) -> Self {
        Self { backend }
    }

    pub fn storage(&self) -> &Arc<dyn LinkStore> {
        &self.backend
    }

    pub async fn links(&self) -> Result<Vec<String>> {
        Ok(self.backend.load().await?.links)
    }

    /// Applies `f` to the current list and stores the result, re-reading and
    /// re-applying when another writer moved the version in between.
    pub async fn update<F>(&self, f: F) -> Result<Vec<String>>
    where
        F: Fn(&[String]) -> Vec<String> + Send + Sync,
    {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let snapshot = self.backend.load().await?;
            let updated = f(&snapshot.links);

            if self
                .backend
                .compare_and_swap(snapshot.version, updated.clone())
                .await?
            {
                return Ok(updated);
            }
            log::debug!("Link list write conflict, retrying (attempt {})", attempt);
        }

        Err(Error::Conflict(MAX_UPDATE_ATTEMPTS))
    }

    /// Puts `new_links` in front of the stored list, keeping their order.
    pub async fn prepend(&self, new_links: &[String]) -> Result<Vec<String>> {
        self.update(|current| new_links.iter().chain(current.iter()).cloned().collect())
            .await
    }

    /// Drops every stored occurrence of the given links.
    pub async fn remove(&self, dead: &HashSet<String>) -> Result<Vec<String>> {
        self.update(|current| {
            current
                .iter()
                .filter(|link| !dead.contains(*link))
                .cloned()
                .collect()
        })
        .await
    }
}
