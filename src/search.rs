//! Search provider
//!
//! Turns a query into an ordered list of result URLs. The default provider
//! scrapes DuckDuckGo's HTML endpoint, which needs no API key.

use crate::config::FetchSettings;
use anyhow::Result;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search provider returned HTTP {0}")]
    Status(u16),
    #[error("search timed out")]
    Timeout,
}

pub trait SearchProvider {
    /// Up to `num_results` result URLs, best first
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>, SearchError>;

    fn name(&self) -> &'static str;
}

impl<P: SearchProvider + ?Sized> SearchProvider for &P {
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>, SearchError> {
        (**self).search(query, num_results)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

pub struct DuckDuckGoProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl DuckDuckGoProvider {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        Self::with_endpoint(settings, DDG_HTML_URL)
    }

    pub fn with_endpoint(settings: &FetchSettings, endpoint: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl SearchProvider for DuckDuckGoProvider {
    fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>, SearchError> {
        debug!(query, "searching");

        let resp = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else {
                    SearchError::Request(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(SearchError::Status(resp.status().as_u16()));
        }

        let html = resp.text().map_err(|e| SearchError::Request(e.to_string()))?;
        Ok(parse_ddg_html(&html, num_results))
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

/// Result links live in `<a class="result__a">`, usually behind a redirect
fn parse_ddg_html(html: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a.result__a") else {
        return vec![];
    };

    let mut urls: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        if urls.len() >= max_results {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(url) = extract_ddg_url(href) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...` -> target URL
fn extract_ddg_url(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        format!("https://duckduckgo.com{}", href)
    };
    let parsed = Url::parse(&absolute).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
        .filter(|target| target.starts_with("http"))
}
