use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{StreamExt, stream};
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::links::{LinkFilter, extract_links, normalize_url};
use crate::progress::{CrawlEvent, ProgressSink};

/// Parses a seed URL and drops its fragment.
pub fn parse_seed(seed: &str) -> Result<Url> {
    let invalid = |reason: &str| Error::InvalidSeed {
        url: seed.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(seed.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs can be crawled"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host"));
    }
    Ok(normalize_url(url))
}

/// Discovers every page of a site reachable from a seed.
pub struct Crawler {
    http_client: HttpClient,
    config: CrawlerConfig,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let http_client = HttpClient::new(config.timeout, &config.user_agent, None)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Breadth-first crawl restricted to the seed's authority.
    ///
    /// Returns the seed followed by every other discovered URL in ascending
    /// order. Pages that fail to load, or are not HTML, contribute no links.
    /// Each BFS level is fetched concurrently, but results are merged in
    /// frontier order, so the outcome matches a sequential crawl. A
    /// `Discovering` event is reported when a page's fetch starts.
    pub async fn crawl<S>(&self, seed: &str, sink: &S) -> Result<Vec<Url>>
    where
        S: ProgressSink<CrawlEvent> + ?Sized,
    {
        let seed = parse_seed(seed)?;
        let filter = LinkFilter::new(&seed, &self.config);
        tracing::info!(
            "Crawl started at {} (concurrency {}, timeout {:?})",
            seed,
            self.config.concurrency,
            self.config.timeout
        );

        let mut seen = HashSet::from([seed.clone()]);
        let mut discovered = vec![seed.clone()];
        let mut frontier = vec![seed.clone()];
        let discovered_count = AtomicUsize::new(discovered.len());
        let discovered_count = &discovered_count;

        while !frontier.is_empty() {
            let mut pages = stream::iter(std::mem::take(&mut frontier))
                .map(|url| async move {
                    sink.report(CrawlEvent::Discovering {
                        current_url: url.to_string(),
                        discovered_so_far: discovered_count.load(Ordering::Relaxed),
                    });
                    let links = self.page_links(&url).await;
                    (url, links)
                })
                .buffered(self.config.concurrency.max(1));

            while let Some((_, links)) = pages.next().await {
                for link in links {
                    if self.limit_reached(discovered.len()) {
                        break;
                    }
                    if filter.accepts(&link) && seen.insert(link.clone()) {
                        tracing::debug!("Discovered {}", link);
                        discovered.push(link.clone());
                        frontier.push(link);
                        discovered_count.store(discovered.len(), Ordering::Relaxed);
                    }
                }
            }

            if self.limit_reached(discovered.len()) {
                tracing::info!("Stopping crawl at {} pages", discovered.len());
                break;
            }
        }

        let mut rest = discovered.split_off(1);
        rest.sort();
        discovered.extend(rest);

        tracing::info!("Crawl finished with {} links", discovered.len());
        sink.report(CrawlEvent::Complete {
            total_links: discovered.len(),
        });
        Ok(discovered)
    }

    fn limit_reached(&self, discovered: usize) -> bool {
        self.config.max_pages.is_some_and(|max| discovered >= max)
    }

    /// Sorted, deduplicated links of one page.
    async fn page_links(&self, url: &Url) -> Vec<Url> {
        match self.http_client.fetch(url).await {
            Ok(page) if page.is_html() => {
                let mut links = extract_links(&page.body, &page.final_url);
                links.sort();
                links.dedup();
                links
            }
            Ok(page) => {
                tracing::debug!(
                    "Skipping links of non-HTML page {} ({})",
                    url,
                    page.content_type.as_deref().unwrap_or("no content type")
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to fetch URL {}: {}", url, e);
                Vec::new()
            }
        }
    }
}
