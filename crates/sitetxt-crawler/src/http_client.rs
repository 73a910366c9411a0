use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;

use crate::error::{Error, FetchError, Result};

/// A fetched page after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the request ended up; relative links resolve against this.
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    /// A missing `Content-Type` is not treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("text/html"))
    }
}

/// Shared `reqwest` client for one stage, so connections are reused.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str, accept: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(accept) = accept {
            let value = HeaderValue::from_str(accept).map_err(|e| Error::InvalidHeader {
                name: ACCEPT.as_str().to_string(),
                reason: e.to_string(),
            })?;
            headers.insert(ACCEPT, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }

    /// GETs `url`. Any non-2xx status is an error.
    pub async fn fetch(&self, url: &Url) -> std::result::Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(FetchError::from_body)?;

        Ok(FetchedPage {
            final_url,
            content_type,
            body,
        })
    }
}
