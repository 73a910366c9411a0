//! Runs discovery and conversion back to back.

use std::path::PathBuf;

use url::Url;

use crate::config::{CrawlerConfig, ExtractorConfig};
use crate::crawler::Crawler;
use crate::document::Document;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::links::{read_link_list, write_link_list};
use crate::progress::{CrawlEvent, ExtractEvent, JobEvent, ProgressSink};

/// Where the pages to convert come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSource {
    /// Crawl from a seed URL.
    Crawl(String),
    /// Reuse a link list saved by an earlier run.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ScrapeJob {
    pub source: LinkSource,
    pub crawler: CrawlerConfig,
    pub extractor: ExtractorConfig,
    /// Saves the link list here before conversion starts.
    pub links_file: Option<PathBuf>,
}

impl ScrapeJob {
    pub fn new(source: LinkSource) -> Self {
        Self {
            source,
            crawler: CrawlerConfig::default(),
            extractor: ExtractorConfig::default(),
            links_file: None,
        }
    }

    /// Obtains the link list only.
    pub async fn discover<S>(&self, sink: &S) -> Result<Vec<Url>>
    where
        S: ProgressSink<JobEvent> + ?Sized,
    {
        report_failure(self.discover_links(sink).await, sink)
    }

    /// Obtains the link list, then converts every page.
    pub async fn run<S>(&self, sink: &S) -> Result<Document>
    where
        S: ProgressSink<JobEvent> + ?Sized,
    {
        report_failure(self.run_stages(sink).await, sink)
    }

    async fn run_stages<S>(&self, sink: &S) -> Result<Document>
    where
        S: ProgressSink<JobEvent> + ?Sized,
    {
        let links = self.discover_links(sink).await?;
        let extractor = Extractor::new(self.extractor.clone())?;
        Ok(extractor
            .extract(&links, &|event: ExtractEvent| {
                sink.report(JobEvent::Extract(event))
            })
            .await)
    }

    async fn discover_links<S>(&self, sink: &S) -> Result<Vec<Url>>
    where
        S: ProgressSink<JobEvent> + ?Sized,
    {
        let links = match &self.source {
            LinkSource::Crawl(seed) => {
                Crawler::new(self.crawler.clone())?
                    .crawl(seed, &|event: CrawlEvent| sink.report(JobEvent::Crawl(event)))
                    .await?
            }
            LinkSource::File(path) => {
                let links = read_link_list(path)?;
                tracing::info!("Loaded {} links from {}", links.len(), path.display());
                links
            }
        };

        if let Some(path) = &self.links_file {
            write_link_list(path, &links)?;
            tracing::info!("Saved {} links to {}", links.len(), path.display());
        }
        Ok(links)
    }
}

fn report_failure<T, S>(result: Result<T>, sink: &S) -> Result<T>
where
    S: ProgressSink<JobEvent> + ?Sized,
{
    if let Err(e) = &result {
        tracing::error!("Job failed: {}", e);
        sink.report(JobEvent::Failed {
            error: e.to_string(),
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
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

    #[tokio::test]
    async fn test_run_crawls_saves_links_and_converts() {
        let server = MockServer::start_async().await;
        html_page(
            &server,
            "/",
            r#"<nav><a href="/guide">Guide</a></nav><main><h1>Home</h1></main>"#,
        )
        .await;
        html_page(&server, "/guide", "<main><p>Read me.</p></main>").await;
        let dir = tempfile::tempdir().unwrap();
        let links_file = dir.path().join("links.txt");
        let job = ScrapeJob {
            links_file: Some(links_file.clone()),
            ..ScrapeJob::new(LinkSource::Crawl(server.url("/")))
        };
        let events = Mutex::new(Vec::new());
        let sink = |event: JobEvent| events.lock().unwrap().push(event);

        let document = job.run(&sink).await.unwrap();

        assert_eq!(
            document.to_string(),
            format!(
                "<!-- Source: {} -->\n\n# Home\n\n---\n\n<!-- Source: {} -->\n\nRead me.\n\n---",
                server.url("/"),
                server.url("/guide")
            )
        );
        assert_eq!(
            std::fs::read_to_string(&links_file).unwrap(),
            format!("{}\n{}", server.url("/"), server.url("/guide"))
        );

        let events = events.into_inner().unwrap();
        assert!(matches!(
            events.first(),
            Some(JobEvent::Crawl(CrawlEvent::Discovering { .. }))
        ));
        assert!(events.contains(&JobEvent::Crawl(CrawlEvent::Complete { total_links: 2 })));
        assert_eq!(
            events.last(),
            Some(&JobEvent::Extract(ExtractEvent::Complete {
                pages: 2,
                percent: 100.0
            }))
        );
    }

    #[tokio::test]
    async fn test_run_from_link_file() {
        let server = MockServer::start_async().await;
        html_page(&server, "/only", "<article><p>Only page.</p></article>").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, server.url("/only")).unwrap();

        let document = ScrapeJob::new(LinkSource::File(path))
            .run(&|_: JobEvent| {})
            .await
            .unwrap();

        assert_eq!(document.records().len(), 1);
        assert_eq!(document.failures().count(), 0);
    }

    #[tokio::test]
    async fn test_run_invalid_seed_reports_failure() {
        let events = Mutex::new(Vec::new());
        let sink = |event: JobEvent| events.lock().unwrap().push(event);

        let result = ScrapeJob::new(LinkSource::Crawl("ftp://example.com/".to_string()))
            .run(&sink)
            .await;

        assert!(matches!(result, Err(Error::InvalidSeed { .. })));
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], JobEvent::Failed { error } if error.contains("ftp://example.com/")));
    }

    #[tokio::test]
    async fn test_discover_only_does_not_extract() {
        let server = MockServer::start_async().await;
        html_page(&server, "/", r#"<a href="/next">Next</a>"#).await;
        let next = server
            .mock_async(|when, then| {
                when.method(GET).path("/next");
                then.status(200).header("content-type", "text/html").body("");
            })
            .await;

        let links = ScrapeJob::new(LinkSource::Crawl(server.url("/")))
            .discover(&|_: JobEvent| {})
            .await
            .unwrap();

        assert_eq!(links.len(), 2);
        next.assert_hits_async(1).await;
    }
}
