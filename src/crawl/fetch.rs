//! Page fetching
//!
//! The crawler only needs "give me the HTML at this URL, or nothing". Anything
//! that can answer that implements [`PageFetcher`]; [`HttpFetcher`] is the real
//! network implementation.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

/// Source of page HTML
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML of a page. `None` means the page is unavailable, is not
    /// HTML, or could not be reached within the fetcher's own retry budget.
    fn fetch(&self, url: &Url) -> Option<String>;
}

/// Blocking HTTP(S) fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `redirects` is the number of redirects followed before giving up
    pub fn new(redirects: usize, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::limited(redirects))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.fetch_retries,
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )
    }
}

/// Media type of a `Content-Type` header value, without parameters
fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Option<String> {
        let response = match self.client.get(url.as_str()).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "fetch failed");
                return None;
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(media_type)
            .unwrap_or("")
            .to_ascii_lowercase();

        if status != StatusCode::OK || content_type != "text/html" {
            tracing::debug!(%url, status = status.as_u16(), content_type = %content_type, "skipping non-HTML response");
            return None;
        }

        match response.text() {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to read page body");
                None
            }
        }
    }
}
