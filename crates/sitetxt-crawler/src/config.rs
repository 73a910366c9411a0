use std::time::Duration;

use sitetxt_markdown::ConversionOptions;

pub const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Some origins reject non-browser agents on content pages.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Markdown sources published next to the rendered pages.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[".md", ".html.md"];
pub const DEFAULT_EXCLUDED_FRAGMENTS: &[&str] = &["cdn-cgi"];

pub fn default_user_agent() -> String {
    format!("sitetxt/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for link discovery.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub timeout: Duration,
    /// Pages fetched at once within one BFS level.
    pub concurrency: usize,
    pub user_agent: String,
    pub excluded_suffixes: Vec<String>,
    pub excluded_fragments: Vec<String>,
    /// Upper bound on discovered URLs, seed included.
    pub max_pages: Option<usize>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CRAWL_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: default_user_agent(),
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_fragments: DEFAULT_EXCLUDED_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_pages: None,
        }
    }
}

/// Settings for page conversion.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub timeout: Duration,
    pub concurrency: usize,
    pub user_agent: String,
    pub accept: String,
    pub conversion: ConversionOptions,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EXTRACT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: BROWSER_ACCEPT.to_string(),
            conversion: ConversionOptions::default(),
        }
    }
}
