use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use itertools::Itertools;
use miette::IntoDiagnostic;
use tokio::sync::mpsc;

use crate::config::{CrawlerConfig, DEFAULT_CONCURRENCY, ExtractorConfig};
use crate::job::{LinkSource, ScrapeJob};
use crate::progress::{CrawlEvent, ExtractEvent, JobEvent};

#[derive(Parser, Debug, Clone)]
#[command(name = "sitetxt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## Flatten a documentation site into one file:\n\
    sitetxt https://docs.example.com/ -o docs.txt\n\n\
    ## Only list the pages that would be converted:\n\
    sitetxt https://docs.example.com/ --crawl-only\n\n\
    ## Convert a previously saved link list:\n\
    sitetxt --links-from links.txt -o docs.txt")]
#[command(
    about = "Crawls a documentation site and flattens its pages into a single Markdown text file.",
    long_about = None
)]
pub struct Cli {
    /// Seed URL; only pages with the same scheme, host and port are crawled
    #[arg(required_unless_present = "links_from", env = "SITETXT_URL")]
    url: Option<String>,

    /// Write the document (or link list with --crawl-only) to this file instead of stdout
    #[arg(short, long, env = "SITETXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Save the discovered link list to this file
    #[arg(long, env = "SITETXT_LINKS_FILE")]
    links_file: Option<PathBuf>,

    /// Skip crawling and convert the URLs listed in this file
    #[arg(long, env = "SITETXT_LINKS_FROM", conflicts_with = "url")]
    links_from: Option<PathBuf>,

    /// Stop after discovery and output the link list
    #[arg(long, env = "SITETXT_CRAWL_ONLY", default_value_t = false)]
    crawl_only: bool,

    /// Number of pages fetched at once
    #[arg(short, long, env = "SITETXT_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-request timeout in seconds while crawling
    #[arg(long, env = "SITETXT_CRAWL_TIMEOUT", default_value_t = 10)]
    crawl_timeout: u64,

    /// Per-request timeout in seconds while converting
    #[arg(long, env = "SITETXT_EXTRACT_TIMEOUT", default_value_t = 30)]
    extract_timeout: u64,

    /// Skip links whose path ends with this suffix (repeatable or comma-separated)
    #[arg(
        long = "exclude-suffix",
        value_name = "SUFFIX",
        env = "SITETXT_EXCLUDE_SUFFIX",
        value_delimiter = ',',
        default_values_t = vec![".md".to_string(), ".html.md".to_string()]
    )]
    exclude_suffixes: Vec<String>,

    /// Stop discovering after this many pages
    #[arg(long, env = "SITETXT_MAX_PAGES")]
    max_pages: Option<usize>,

    /// How progress is reported on stderr
    #[arg(long, value_enum, env = "SITETXT_PROGRESS", default_value_t)]
    progress: ProgressFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, clap::ValueEnum)]
pub enum ProgressFormat {
    #[default]
    Text,
    Json,
    None,
}

impl Cli {
    pub async fn run(self) -> miette::Result<()> {
        let job = self.job();
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = tokio::spawn(report_progress(rx, self.progress));
        let sink = move |event: JobEvent| {
            let _ = tx.send(event);
        };

        let output = if self.crawl_only {
            job.discover(&sink)
                .await
                .map(|links| links.iter().map(|url| url.as_str()).join("\n"))
        } else {
            job.run(&sink).await.map(|document| document.to_string())
        };

        drop(sink);
        reporter.await.into_diagnostic()?;

        self.write_output(&output?)
    }

    fn job(&self) -> ScrapeJob {
        let source = match (&self.links_from, &self.url) {
            (Some(path), _) => LinkSource::File(path.clone()),
            (None, Some(url)) => LinkSource::Crawl(url.clone()),
            (None, None) => LinkSource::Crawl(String::new()),
        };

        ScrapeJob {
            source,
            crawler: CrawlerConfig {
                timeout: Duration::from_secs(self.crawl_timeout),
                concurrency: self.concurrency,
                excluded_suffixes: self.exclude_suffixes.clone(),
                max_pages: self.max_pages,
                ..Default::default()
            },
            extractor: ExtractorConfig {
                timeout: Duration::from_secs(self.extract_timeout),
                concurrency: self.concurrency,
                ..Default::default()
            },
            links_file: self.links_file.clone(),
        }
    }

    fn write_output(&self, content: &str) -> miette::Result<()> {
        match &self.output {
            Some(path) => {
                std::fs::write(path, content).into_diagnostic()?;
                tracing::info!("Output written to {}", path.display());
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(content.as_bytes()).into_diagnostic()?;
                writeln!(handle).into_diagnostic()?;
                handle.flush().into_diagnostic()?;
            }
        }
        Ok(())
    }
}

async fn report_progress(mut rx: mpsc::UnboundedReceiver<JobEvent>, format: ProgressFormat) {
    while let Some(event) = rx.recv().await {
        match format {
            ProgressFormat::None => {}
            ProgressFormat::Json => match serde_json::to_string(&event) {
                Ok(line) => eprintln!("{}", line),
                Err(e) => tracing::debug!("Failed to serialize progress event: {}", e),
            },
            ProgressFormat::Text => eprintln!("{}", progress_line(&event)),
        }
    }
}

fn progress_line(event: &JobEvent) -> String {
    match event {
        JobEvent::Crawl(CrawlEvent::Discovering {
            current_url,
            discovered_so_far,
        }) => format!("Discovering {} ({} found)", current_url, discovered_so_far),
        JobEvent::Crawl(CrawlEvent::Complete { total_links }) => {
            format!("Found {} links", total_links)
        }
        JobEvent::Extract(ExtractEvent::Converting {
            url,
            current,
            total,
            percent,
        }) => format!("[{}/{}] {:.2}% {}", current, total, percent, url),
        JobEvent::Extract(ExtractEvent::Complete { pages, .. }) => {
            format!("Converted {} pages", pages)
        }
        JobEvent::Failed { error } => format!("Failed: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use rstest::rstest;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["sitetxt", "https://docs.example.com/"]).unwrap();
        let job = cli.job();

        assert_eq!(
            job.source,
            LinkSource::Crawl("https://docs.example.com/".to_string())
        );
        assert_eq!(job.crawler.timeout, Duration::from_secs(10));
        assert_eq!(job.extractor.timeout, Duration::from_secs(30));
        assert_eq!(job.crawler.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(job.crawler.excluded_suffixes, vec![".md", ".html.md"]);
        assert_eq!(job.crawler.max_pages, None);
        assert_eq!(cli.progress, ProgressFormat::Text);
        assert!(!cli.crawl_only);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "sitetxt",
            "https://docs.example.com/",
            "-c",
            "2",
            "--crawl-timeout",
            "3",
            "--extract-timeout",
            "4",
            "--exclude-suffix",
            ".pdf",
            "--exclude-suffix",
            ".zip",
            "--max-pages",
            "50",
            "--links-file",
            "links.txt",
            "--progress",
            "json",
        ])
        .unwrap();
        let job = cli.job();

        assert_eq!(job.crawler.concurrency, 2);
        assert_eq!(job.extractor.concurrency, 2);
        assert_eq!(job.crawler.timeout, Duration::from_secs(3));
        assert_eq!(job.extractor.timeout, Duration::from_secs(4));
        assert_eq!(job.crawler.excluded_suffixes, vec![".pdf", ".zip"]);
        assert_eq!(job.crawler.max_pages, Some(50));
        assert_eq!(job.links_file, Some(PathBuf::from("links.txt")));
        assert_eq!(cli.progress, ProgressFormat::Json);
    }

    #[test]
    fn test_cli_links_from() {
        let cli = Cli::try_parse_from(["sitetxt", "--links-from", "links.txt"]).unwrap();
        assert_eq!(cli.job().source, LinkSource::File(PathBuf::from("links.txt")));
    }

    #[rstest]
    #[case::missing_source(vec!["sitetxt"])]
    #[case::both_sources(vec!["sitetxt", "https://docs.example.com/", "--links-from", "links.txt"])]
    #[case::bad_progress(vec!["sitetxt", "https://docs.example.com/", "--progress", "xml"])]
    fn test_cli_rejects(#[case] args: Vec<&str>) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case(
        JobEvent::Crawl(CrawlEvent::Discovering { current_url: "https://ex.com/".to_string(), discovered_so_far: 3 }),
        "Discovering https://ex.com/ (3 found)"
    )]
    #[case(
        JobEvent::Extract(ExtractEvent::converting("https://ex.com/a", 1, 3)),
        "[1/3] 33.33% https://ex.com/a"
    )]
    #[case(JobEvent::Failed { error: "boom".to_string() }, "Failed: boom")]
    fn test_progress_line(#[case] event: JobEvent, #[case] expected: &str) {
        assert_eq!(progress_line(&event), expected);
    }

    #[tokio::test]
    async fn test_run_writes_document_to_output() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<main><h1>Docs</h1></main>");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("site.txt");
        let cli = Cli::try_parse_from([
            "sitetxt".to_string(),
            server.url("/"),
            "--progress".to_string(),
            "none".to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ])
        .unwrap();

        cli.run().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            format!("<!-- Source: {} -->\n\n# Docs\n\n---", server.url("/"))
        );
    }

    #[tokio::test]
    async fn test_run_invalid_seed_fails() {
        let cli = Cli::try_parse_from(["sitetxt", "not-a-url", "--progress", "none"]).unwrap();
        assert!(cli.run().await.is_err());
    }
}
