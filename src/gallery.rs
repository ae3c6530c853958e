use crate::{
    error::{Error, Result},
    models::strip_query,
    storage::LinkRepository,
    validator::LinkValidator,
};
use reqwest::Client;
use std::path::{Path, PathBuf};

pub struct Gallery {
    client: Client,
    links: LinkRepository,
    validator: LinkValidator,
}

impl Gallery {
    pub fn new(links: LinkRepository, validator: LinkValidator) -> Self {
        Self {
            client: Client::new(),
            links,
            validator,
        }
    }

    /// Persisted links that still load, newest first.
    pub async fn links(&self) -> Result<Vec<String>> {
        self.validator.get_valid_image_links(&self.links).await
    }

    /// Downloads every valid link into `dir`. A link that fails to download
    /// is logged and skipped.
    pub async fn download_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::new();
        for (index, link) in self.links().await?.iter().enumerate() {
            let path = dir.join(file_name_for(link, index));
            match self.download(link, &path).await {
                Ok(()) => {
                    log::info!("Image saved to: {}", path.display());
                    written.push(path);
                }
                Err(e) => log::error!("Failed to download {}: {}", link, e),
            }
        }
        Ok(written)
    }

    async fn download(&self, link: &str, path: &Path) -> Result<()> {
        let response = self.client.get(link).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("download of {} failed", link),
            });
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}

/// Last path segment of the link, or a timestamped name when the link ends
/// in a slash or has an unusable segment.
fn file_name_for(link: &str, index: usize) -> String {
    let stripped = strip_query(link);
    let segment = stripped.rsplit('/').next().unwrap_or_default();
    let usable = !segment.is_empty()
        && !segment.contains(':')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if usable {
        format!("{:03}_{}", index, segment)
    } else {
        format!(
            "{:03}_image_{}.png",
            index,
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::storage::MemoryLinkStore;
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[test]
    fn names_files_after_the_url() {
        assert_eq!(file_name_for("https://x/a/img.png?sig=1", 0), "000_img.png");
        assert!(file_name_for("https://x/a/", 2).starts_with("002_image_"));
        assert!(file_name_for("https://x/a/%20weird", 3).starts_with("003_image_"));
    }

    #[tokio::test]
    async fn downloads_valid_links() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/fox.png");
                then.status(200)
                    .header("content-type", "image/png")
                    .body("fox-bytes");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone.png");
                then.status(404);
            })
            .await;

        let repo = LinkRepository::from_store(Arc::new(MemoryLinkStore::with_links(vec![
            server.url("/fox.png"),
            server.url("/gone.png"),
        ])));
        let gallery = Gallery::new(repo.clone(), LinkValidator::new(&ValidatorConfig::new()));

        let dir = tempfile::tempdir()?;
        let written = gallery.download_all(dir.path()).await?;

        assert_eq!(written, vec![dir.path().join("000_fox.png")]);
        assert_eq!(std::fs::read_to_string(&written[0])?, "fox-bytes");
        assert_eq!(repo.links().await?, vec![server.url("/fox.png")]);
        Ok(())
    }
}
