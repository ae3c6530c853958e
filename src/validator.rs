use crate::{
    config::ValidatorConfig,
    error::Result,
    models::{LinkCheck, LinkStatus},
    storage::LinkRepository,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{header::CONTENT_TYPE, Client};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a link still points at a loadable image.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> LinkStatus;
}

/// Fetches the link and accepts success responses whose content type, when
/// present, is an image.
#[derive(Clone, Default)]
pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return LinkStatus::Unreachable(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return LinkStatus::Unreachable(format!("HTTP {}", status.as_u16()));
        }

        match response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(content_type) if !content_type.starts_with("image/") => {
                LinkStatus::Unreachable(format!("not an image: {}", content_type))
            }
            _ => LinkStatus::Reachable,
        }
    }
}

#[derive(Clone)]
pub struct LinkValidator {
    probe: Arc<dyn ImageProbe>,
    concurrency: usize,
    timeout: Duration,
}

impl LinkValidator {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self::with_probe(Arc::new(HttpImageProbe::default()), config)
    }

    pub fn with_probe(probe: Arc<dyn ImageProbe>, config: &ValidatorConfig) -> Self {
        Self {
            probe,
            concurrency: config.concurrency.max(1),
            timeout: if config.timeout.is_zero() {
                ValidatorConfig::default().timeout
            } else {
                config.timeout
            },
        }
    }

    /// Probes every link with at most `concurrency` checks in flight.
    /// Results come back in input order.
    pub async fn check_links(&self, urls: &[String]) -> Vec<LinkCheck> {
        stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let status = match tokio::time::timeout(self.timeout, self.probe.probe(&url)).await
                {
                    Ok(status) => status,
                    Err(_) => LinkStatus::TimedOut,
                };
                if status != LinkStatus::Reachable {
                    log::info!("Error loading image: {} ({:?})", url, status);
                }
                LinkCheck { url, status }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Checks the persisted links, drops the dead ones from the store and
    /// returns what is left. Links another writer added in the meantime are
    /// kept.
    pub async fn get_valid_image_links(&self, repo: &LinkRepository) -> Result<Vec<String>> {
        let links = repo.links().await?;
        if links.is_empty() {
            return Ok(links);
        }

        let timer = crate::logger::timer("link validation");
        let checks = self.check_links(&links).await;
        drop(timer);

        let dead: HashSet<String> = checks
            .into_iter()
            .filter(|check| !check.is_valid())
            .map(|check| check.url)
            .collect();

        if dead.is_empty() {
            return Ok(links);
        }

        log::info!("Pruning {} unreachable link(s)", dead.len());
        repo.remove(&dead).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LinkStore, MemoryLinkStore};
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed table; unknown links are unreachable.
    struct TableProbe {
        answers: HashMap<String, LinkStatus>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TableProbe {
        fn new(answers: &[(&str, LinkStatus)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(url, status)| (url.to_string(), status.clone()))
                    .collect(),
                delay: Duration::from_millis(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ImageProbe for TableProbe {
        async fn probe(&self, url: &str) -> LinkStatus {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.answers
                .get(url)
                .cloned()
                .unwrap_or_else(|| LinkStatus::Unreachable("unknown".into()))
        }
    }

    fn repo_with(links: &[&str]) -> LinkRepository {
        LinkRepository::from_store(Arc::new(MemoryLinkStore::with_links(
            links.iter().map(|s| s.to_string()).collect(),
        )))
    }

    #[tokio::test]
    async fn prunes_links_that_fail_to_load() {
        let probe = TableProbe::new(&[("b.png", LinkStatus::Reachable)]);
        let validator = LinkValidator::with_probe(Arc::new(probe), &ValidatorConfig::new());
        let repo = repo_with(&["a.png", "b.png"]);

        let valid = validator.get_valid_image_links(&repo).await.unwrap();

        assert_eq!(valid, vec!["b.png"]);
        assert_eq!(repo.links().await.unwrap(), vec!["b.png"]);
    }

    #[tokio::test]
    async fn revalidating_is_idempotent() {
        let probe = TableProbe::new(&[
            ("a.png", LinkStatus::Reachable),
            ("b.png", LinkStatus::Reachable),
        ]);
        let validator = LinkValidator::with_probe(Arc::new(probe), &ValidatorConfig::new());
        let repo = repo_with(&["a.png", "b.png", "gone.png"]);

        let first = validator.get_valid_image_links(&repo).await.unwrap();
        let version = repo.storage().load().await.unwrap().version;
        let second = validator.get_valid_image_links(&repo).await.unwrap();

        assert_eq!(first, vec!["a.png", "b.png"]);
        assert_eq!(second, first);
        assert_eq!(repo.storage().load().await.unwrap().version, version);
    }

    #[tokio::test]
    async fn slow_links_time_out() {
        let probe = TableProbe::new(&[("slow.png", LinkStatus::Reachable)])
            .with_delay(Duration::from_millis(500));
        let config = ValidatorConfig::new().with_timeout(Duration::from_millis(20));
        let validator = LinkValidator::with_probe(Arc::new(probe), &config);

        let checks = validator.check_links(&["slow.png".to_string()]).await;

        assert_eq!(
            checks,
            vec![LinkCheck {
                url: "slow.png".into(),
                status: LinkStatus::TimedOut
            }]
        );
    }

    #[tokio::test]
    async fn zero_timeout_does_not_prune_live_links() {
        let probe = TableProbe::new(&[("a.png", LinkStatus::Reachable)]);
        let config = ValidatorConfig {
            concurrency: 1,
            timeout: Duration::ZERO,
        };
        let validator = LinkValidator::with_probe(Arc::new(probe), &config);
        let repo = repo_with(&["a.png"]);

        assert_eq!(validator.get_valid_image_links(&repo).await.unwrap(), vec!["a.png"]);
        assert_eq!(repo.links().await.unwrap(), vec!["a.png"]);
    }

    #[tokio::test]
    async fn respects_concurrency_and_order() {
        let urls: Vec<String> = (0..10).map(|i| format!("{}.png", i)).collect();
        let answers: Vec<(&str, LinkStatus)> = urls
            .iter()
            .map(|u| (u.as_str(), LinkStatus::Reachable))
            .collect();
        let probe = Arc::new(TableProbe::new(&answers).with_delay(Duration::from_millis(10)));
        let config = ValidatorConfig::new().with_concurrency(3);
        let validator = LinkValidator::with_probe(probe.clone(), &config);

        let checks = validator.check_links(&urls).await;

        let checked: Vec<&str> = checks.iter().map(|c| c.url.as_str()).collect();
        let expected: Vec<&str> = urls.iter().map(String::as_str).collect();
        assert_eq!(checked, expected);
        assert!(checks.iter().all(LinkCheck::is_valid));
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn http_probe_requires_an_image() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok.png");
                then.status(200)
                    .header("content-type", "image/png")
                    .body("png");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/page.png");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html>");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.png");
                then.status(404);
            })
            .await;

        let probe = HttpImageProbe::default();
        assert_eq!(probe.probe(&server.url("/ok.png")).await, LinkStatus::Reachable);
        assert!(matches!(
            probe.probe(&server.url("/page.png")).await,
            LinkStatus::Unreachable(_)
        ));
        assert_eq!(
            probe.probe(&server.url("/missing.png")).await,
            LinkStatus::Unreachable("HTTP 404".into())
        );
    }
}
