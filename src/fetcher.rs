//! Page Fetcher
//!
//! Fetches a single URL and returns its body, or a typed reason why it could
//! not. Failures are never retried here; callers turn them into placeholders.

use crate::config::FetchSettings;
use anyhow::Result;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a page could not be fetched
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {code} for {url}")]
    Status { code: u16, url: String },
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("could not read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Status { code: 404 | 410, .. } => "not_found",
            FetchError::Status { code: 403, .. } => "forbidden",
            FetchError::Status { code: 429, .. } => "rate_limited",
            FetchError::Status { code: 500..=599, .. } => "server_error",
            FetchError::Status { .. } => "http_error",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Network { .. } => "network_error",
            FetchError::Body { .. } => "body_error",
        }
    }
}

/// Anything that can turn a URL into page text
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "fetching page");

        let resp = self.client.get(url).send().map_err(|e| classify_request_error(url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn classify_request_error(url: &str, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
