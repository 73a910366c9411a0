use futures::{StreamExt, stream};
use sitetxt_markdown::extract_main_markdown;
use url::Url;

use crate::config::ExtractorConfig;
use crate::document::{Document, PageRecord};
use crate::error::{PageError, Result};
use crate::http_client::HttpClient;
use crate::progress::{ExtractEvent, ProgressSink};

/// Fetches pages and turns each into a [`PageRecord`].
pub struct Extractor {
    http_client: HttpClient,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let http_client =
            HttpClient::new(config.timeout, &config.user_agent, Some(&config.accept))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Converts every URL, in input order.
    ///
    /// Page failures become [`PageRecord::Failed`] entries; the call itself
    /// cannot fail.
    pub async fn extract<S>(&self, links: &[Url], sink: &S) -> Document
    where
        S: ProgressSink<ExtractEvent> + ?Sized,
    {
        let total = links.len();
        tracing::info!("Converting {} pages", total);

        let mut slots: Vec<Option<PageRecord>> = vec![None; total];
        let mut records = stream::iter(links.iter().enumerate())
            .map(|(index, url)| async move {
                sink.report(ExtractEvent::converting(url.as_str(), index + 1, total));
                (index, self.extract_page(url).await)
            })
            .buffer_unordered(self.config.concurrency.max(1));

        while let Some((index, record)) = records.next().await {
            slots[index] = Some(record);
        }

        let records: Vec<PageRecord> = slots.into_iter().flatten().collect();
        let failures = records.iter().filter(|record| record.is_failed()).count();
        tracing::info!(
            "Converted {} pages ({} failed)",
            records.len() - failures,
            failures
        );

        sink.report(ExtractEvent::Complete {
            pages: total,
            percent: 100.0,
        });
        Document::new(records)
    }

    async fn extract_page(&self, url: &Url) -> PageRecord {
        match self.page_markdown(url).await {
            Ok(markdown) => PageRecord::Parsed {
                url: url.clone(),
                markdown,
            },
            Err(e) => {
                tracing::warn!("Failed to convert {}: {}", url, e);
                PageRecord::Failed {
                    url: url.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn page_markdown(&self, url: &Url) -> std::result::Result<String, PageError> {
        let page = self.http_client.fetch(url).await?;
        let content = extract_main_markdown(&page.body, &self.config.conversion)?;
        tracing::debug!("Main content of {} selected by {}", url, content.strategy);
        Ok(content.markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use std::sync::Mutex;

    async fn html_page(server: &MockServer, path: &str, body: &str) {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .header("content-type", "text/html")
                    .body(body);
            })
            .await;
    }

    fn url(server: &MockServer, path: &str) -> Url {
        Url::parse(&server.url(path)).unwrap()
    }

    #[tokio::test]
    async fn test_extract_isolates_failures() {
        let server = MockServer::start_async().await;
        html_page(&server, "/one", "<main><h1>One</h1><p>First page.</p></main>").await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/two");
                then.status(500);
            })
            .await;
        html_page(&server, "/three", "<article><p>Third page.</p></article>").await;
        let links = vec![
            url(&server, "/one"),
            url(&server, "/two"),
            url(&server, "/three"),
        ];

        let document = Extractor::new(ExtractorConfig::default())
            .unwrap()
            .extract(&links, &|_: ExtractEvent| {})
            .await;

        assert_eq!(document.records().len(), 3);
        assert_eq!(document.failures().count(), 1);
        assert_eq!(
            document.to_string(),
            format!(
                "<!-- Source: {} -->\n\n# One\n\nFirst page.\n\n---\n\n\
                 <!-- Failed to parse {}: HTTP status 500 Internal Server Error -->\n\n---\n\n\
                 <!-- Source: {} -->\n\nThird page.\n\n---",
                links[0], links[1], links[2]
            )
        );
    }

    #[tokio::test]
    async fn test_extract_keeps_input_order_with_concurrency() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200)
                    .header("content-type", "text/html")
                    .delay(std::time::Duration::from_millis(200))
                    .body("<main><p>slow</p></main>");
            })
            .await;
        html_page(&server, "/fast", "<main><p>fast</p></main>").await;
        let links = vec![url(&server, "/slow"), url(&server, "/fast")];
        let config = ExtractorConfig {
            concurrency: 2,
            ..Default::default()
        };

        let document = Extractor::new(config)
            .unwrap()
            .extract(&links, &|_: ExtractEvent| {})
            .await;

        let urls: Vec<&Url> = document.records().iter().map(PageRecord::url).collect();
        assert_eq!(urls, vec![&links[0], &links[1]]);
    }

    #[tokio::test]
    async fn test_extract_nav_only_page_is_failure() {
        let server = MockServer::start_async().await;
        html_page(
            &server,
            "/nav",
            "<html><body><nav><div>Home Docs Blog</div></nav></body></html>",
        )
        .await;
        let links = vec![url(&server, "/nav")];

        let document = Extractor::new(ExtractorConfig::default())
            .unwrap()
            .extract(&links, &|_: ExtractEvent| {})
            .await;

        assert_eq!(
            document.to_string(),
            format!(
                "<!-- Failed to parse {}: no main content found -->\n\n---",
                links[0]
            )
        );
    }

    #[tokio::test]
    async fn test_extract_sends_browser_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/page")
                    .header("user-agent", crate::config::BROWSER_USER_AGENT)
                    .header("accept", crate::config::BROWSER_ACCEPT);
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<main><p>ok</p></main>");
            })
            .await;

        let document = Extractor::new(ExtractorConfig::default())
            .unwrap()
            .extract(&[url(&server, "/page")], &|_: ExtractEvent| {})
            .await;

        mock.assert_async().await;
        assert_eq!(document.failures().count(), 0);
    }

    #[tokio::test]
    async fn test_extract_reports_progress() {
        let server = MockServer::start_async().await;
        html_page(&server, "/a", "<main><p>a</p></main>").await;
        html_page(&server, "/b", "<main><p>b</p></main>").await;
        html_page(&server, "/c", "<main><p>c</p></main>").await;
        let links = vec![url(&server, "/a"), url(&server, "/b"), url(&server, "/c")];
        let events = Mutex::new(Vec::new());
        let sink = |event: ExtractEvent| events.lock().unwrap().push(event);
        let config = ExtractorConfig {
            concurrency: 1,
            ..Default::default()
        };

        Extractor::new(config)
            .unwrap()
            .extract(&links, &sink)
            .await;

        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                ExtractEvent::converting(links[0].as_str(), 1, 3),
                ExtractEvent::converting(links[1].as_str(), 2, 3),
                ExtractEvent::converting(links[2].as_str(), 3, 3),
                ExtractEvent::Complete {
                    pages: 3,
                    percent: 100.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_extract_empty_input() {
        let document = Extractor::new(ExtractorConfig::default())
            .unwrap()
            .extract(&[], &|_: ExtractEvent| {})
            .await;

        assert!(document.records().is_empty());
        assert_eq!(document.to_string(), "");
    }
}
