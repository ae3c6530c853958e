use crate::{error::Result, models::LinkSnapshot};
use async_trait::async_trait;

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Current link list and its version. A store that was never written
    /// reports version 0 and no links.
    async fn load(&self) -> Result<LinkSnapshot>;

    /// Replaces the list only if the stored version still equals
    /// `expected_version`, bumping the version on success. Returns `false`
    /// when another writer got there first.
    async fn compare_and_swap(&self, expected_version: u64, links: Vec<String>) -> Result<bool>;
}
