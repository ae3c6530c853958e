use crate::{
    error::{Error, Result},
    models::LinkSnapshot,
    storage::traits::LinkStore,
};
use async_trait::async_trait;
use fd_lock::RwLock;
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// On-disk shapes. A bare array is what an unversioned store holds.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLinks {
    Versioned(LinkSnapshot),
    Bare(Vec<String>),
}

/// Link list kept as a JSON document on disk.
///
/// A compare-and-swap holds an exclusive OS lock on `<path>.lock` for the
/// whole read, check and write, so separate stores and separate processes
/// on the same path serialize. Writes go through a uniquely named temp file
/// in the same directory and a rename, so readers never see a partial
/// document.
pub struct FileLinkStore {
    path: PathBuf,
}

impl FileLinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut lock = self.path.clone().into_os_string();
        lock.push(".lock");
        PathBuf::from(lock)
    }
}

fn read_snapshot(path: &Path) -> Result<LinkSnapshot> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LinkSnapshot::default()),
        Err(e) => {
            return Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    // An empty file or a JSON `null` is an empty list.
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(LinkSnapshot::default());
    }

    let stored: StoredLinks = serde_json::from_str(trimmed)
        .map_err(|e| Error::Storage(format!("Corrupt link file {}: {}", path.display(), e)))?;

    Ok(match stored {
        StoredLinks::Versioned(snapshot) => snapshot,
        StoredLinks::Bare(links) => LinkSnapshot { version: 0, links },
    })
}

fn write_snapshot(path: &Path, snapshot: &LinkSnapshot) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, snapshot)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::from(e.error))?;
    Ok(())
}

fn swap_locked(
    path: &Path,
    lock_path: &Path,
    expected_version: u64,
    links: Vec<String>,
) -> Result<bool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(lock_path)?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock.write()?;

    let current = read_snapshot(path)?;
    if current.version != expected_version {
        log::debug!(
            "Link file version moved from {} to {}",
            expected_version,
            current.version
        );
        return Ok(false);
    }

    write_snapshot(
        path,
        &LinkSnapshot {
            version: current.version + 1,
            links,
        },
    )?;
    Ok(true)
}

#[async_trait]
impl LinkStore for FileLinkStore {
    async fn load(&self) -> Result<LinkSnapshot> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_snapshot(&path))
            .await
            .map_err(|e| Error::Storage(format!("Link file read aborted: {}", e)))?
    }

    async fn compare_and_swap(&self, expected_version: u64, links: Vec<String>) -> Result<bool> {
        let path = self.path.clone();
        let lock_path = self.lock_path();
        tokio::task::spawn_blocking(move || swap_locked(&path, &lock_path, expected_version, links))
            .await
            .map_err(|e| Error::Storage(format!("Link file write aborted: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LinkRepository;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_file_is_empty() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileLinkStore::new(dir.path().join("links.json"));
        assert_eq!(store.load().await?, LinkSnapshot::default());
        Ok(())
    }

    #[tokio::test]
    async fn swaps_and_bumps_version() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileLinkStore::new(dir.path().join("nested").join("links.json"));

        assert!(store.compare_and_swap(0, vec!["a.png".into()]).await?);
        assert!(!store.compare_and_swap(0, vec!["b.png".into()]).await?);

        let snapshot = store.load().await?;
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.links, vec!["a.png"]);

        let raw = std::fs::read_to_string(store.path())?;
        let json: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(json["imageLinks"], serde_json::json!(["a.png"]));
        Ok(())
    }

    #[tokio::test]
    async fn reads_bare_arrays() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("links.json");
        std::fs::write(&path, r#"["a.png","b.png"]"#)?;

        let store = FileLinkStore::new(&path);
        let snapshot = store.load().await?;
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.links, vec!["a.png", "b.png"]);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("links.json");
        std::fs::write(&path, "{not json")?;

        assert!(matches!(FileLinkStore::new(&path).load().await, Err(Error::Storage(_))));
        Ok(())
    }

    #[tokio::test]
    async fn null_file_is_empty() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("links.json");
        std::fs::write(&path, "null\n")?;

        assert_eq!(FileLinkStore::new(&path).load().await?, LinkSnapshot::default());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn separate_stores_on_one_path_keep_every_update() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("links.json");
        let first = LinkRepository::from_store(Arc::new(FileLinkStore::new(&path)));
        let second = LinkRepository::from_store(Arc::new(FileLinkStore::new(&path)));

        for round in 0..25 {
            let a = vec![format!("a{}", round)];
            let b = vec![format!("b{}", round)];
            let (ra, rb) = tokio::join!(first.prepend(&a), second.prepend(&b));
            ra?;
            rb?;
        }

        let snapshot = FileLinkStore::new(&path).load().await?;
        assert_eq!(snapshot.links.len(), 50);
        assert_eq!(snapshot.version, 50);
        for round in 0..25 {
            assert!(snapshot.links.contains(&format!("a{}", round)));
            assert!(snapshot.links.contains(&format!("b{}", round)));
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "links.json" && name != "links.json.lock")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {:?}", leftovers);
        Ok(())
    }
}
