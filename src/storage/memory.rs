use crate::{error::Result, models::LinkSnapshot, storage::traits::LinkStore};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryLinkStore {
    inner: Mutex<LinkSnapshot>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(links: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(LinkSnapshot { version: 0, links }),
        }
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn load(&self) -> Result<LinkSnapshot> {
        Ok(self.inner.lock().await.clone())
    }

    async fn compare_and_swap(&self, expected_version: u64, links: Vec<String>) -> Result<bool> {
        let mut current = self.inner.lock().await;
        if current.version != expected_version {
            return Ok(false);
        }
        current.version += 1;
        current.links = links;
        Ok(true)
    }
}
