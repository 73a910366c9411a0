//! Flattens a documentation website into one Markdown text document.
//!
//! Work happens in two stages:
//!
//! - **Discovery**: a breadth-first crawl from a seed URL collects every page
//!   with the same scheme, host and port
//! - **Extraction**: each page is fetched, reduced to its main content and
//!   converted to Markdown, then all pages are concatenated with source
//!   annotations
//!
//! Page-level failures never abort a run. A page that cannot be fetched
//! contributes no links during discovery and a failure comment during
//! extraction.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sitetxt_crawler::{LinkSource, ScrapeJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let job = ScrapeJob::new(LinkSource::Crawl("https://docs.example.com/".to_string()));
//!     let document = job.run(&|event| eprintln!("{:?}", event)).await?;
//!     println!("{}", document);
//!     Ok(())
//! }
//! ```
pub mod cli;
pub mod config;
pub mod crawler;
pub mod document;
pub mod error;
pub mod extractor;
pub mod http_client;
pub mod job;
pub mod links;
pub mod progress;

pub use cli::Cli;
pub use config::{CrawlerConfig, ExtractorConfig};
pub use crawler::Crawler;
pub use document::{Document, PageRecord};
pub use error::{Error, FetchError, PageError, Result};
pub use extractor::Extractor;
pub use job::{LinkSource, ScrapeJob};
pub use progress::{CrawlEvent, ExtractEvent, JobEvent, ProgressSink};
