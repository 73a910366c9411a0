//! URL normalization, scope filtering and link list persistence.

use std::path::Path;
use std::sync::LazyLock;

use itertools::Itertools;
use scraper::{Html, Selector};
use url::{Origin, Url};

use crate::config::CrawlerConfig;
use crate::error::{Error, Result};

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Failed to parse 'a[href]' selector"));

/// Drops the fragment, which never changes the fetched document.
pub fn normalize_url(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Decides which discovered URLs belong to the crawl.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    origin: Origin,
    excluded_suffixes: Vec<String>,
    excluded_fragments: Vec<String>,
}

impl LinkFilter {
    pub fn new(seed: &Url, config: &CrawlerConfig) -> Self {
        Self {
            origin: seed.origin(),
            excluded_suffixes: config.excluded_suffixes.clone(),
            excluded_fragments: config.excluded_fragments.clone(),
        }
    }

    pub fn accepts(&self, url: &Url) -> bool {
        if url.origin() != self.origin {
            tracing::debug!("Skipping URL outside the seed authority: {}", url);
            return false;
        }

        let path = url.path();
        if self
            .excluded_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
        {
            tracing::debug!("Skipping resource URL: {}", url);
            return false;
        }

        if self
            .excluded_fragments
            .iter()
            .any(|fragment| url.as_str().contains(fragment.as_str()))
        {
            tracing::debug!("Skipping excluded URL: {}", url);
            return false;
        }

        true
    }
}

/// Resolves every `a[href]` of `html_content` against `base_url`.
pub fn extract_links(html_content: &str, base_url: &Url) -> Vec<Url> {
    if html_content.is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(html_content);
    let found_urls: Vec<Url> = document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| match base_url.join(href) {
            Ok(url) => Some(normalize_url(url)),
            Err(e) => {
                tracing::debug!(
                    "Failed to parse or join URL '{}' with base '{}': {}",
                    href,
                    base_url,
                    e
                );
                None
            }
        })
        .collect();

    tracing::debug!("Extracted {} links from {}", found_urls.len(), base_url);
    found_urls
}

/// Writes one URL per line, without a trailing newline.
pub fn write_link_list(path: &Path, links: &[Url]) -> Result<()> {
    std::fs::write(path, links.iter().map(Url::as_str).join("\n")).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a list written by [`write_link_list`]. Blank lines are skipped.
pub fn read_link_list(path: &Path) -> Result<Vec<Url>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            Url::parse(line.trim()).map_err(|e| Error::InvalidLinkList {
                path: path.to_path_buf(),
                line: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}
