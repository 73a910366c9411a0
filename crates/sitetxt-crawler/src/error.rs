use std::path::PathBuf;

use miette::Diagnostic;
use reqwest::StatusCode;
use sitetxt_markdown::HtmlToMarkdownError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole run.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Invalid seed URL '{url}': {reason}")]
    #[diagnostic(
        code(sitetxt::seed::invalid),
        help("Pass an absolute http:// or https:// URL with a host.")
    )]
    InvalidSeed { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    #[diagnostic(code(sitetxt::http::client))]
    Client(#[source] reqwest::Error),

    #[error("Invalid value for header '{name}': {reason}")]
    #[diagnostic(code(sitetxt::http::header))]
    InvalidHeader { name: String, reason: String },

    #[error("I/O error on '{}': {source}", .path.display())]
    #[diagnostic(code(sitetxt::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL on line {line} of '{}': {reason}", .path.display())]
    #[diagnostic(
        code(sitetxt::links::invalid_list),
        help("A link list holds one absolute URL per line.")
    )]
    InvalidLinkList {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Failure to retrieve a single page.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("request timed out")]
    #[diagnostic(code(sitetxt::fetch::timeout))]
    Timeout,

    #[error("request failed: {0}")]
    #[diagnostic(code(sitetxt::fetch::request))]
    Request(#[source] reqwest::Error),

    #[error("HTTP status {0}")]
    #[diagnostic(code(sitetxt::fetch::status))]
    Status(StatusCode),

    #[error("failed to read response body: {0}")]
    #[diagnostic(code(sitetxt::fetch::body))]
    Body(#[source] reqwest::Error),
}

impl FetchError {
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }

    pub(crate) fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Body(err)
        }
    }
}

/// Why a page produced a failure record instead of Markdown.
#[derive(Debug, Error, Diagnostic)]
pub enum PageError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Content(#[from] HtmlToMarkdownError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_messages() {
        assert_eq!(
            PageError::from(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR)).to_string(),
            "HTTP status 500 Internal Server Error"
        );
        assert_eq!(
            PageError::from(HtmlToMarkdownError::NoContentFound).to_string(),
            "no main content found"
        );
    }
}
