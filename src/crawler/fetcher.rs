//! Plain HTTP fetching
//!
//! This module handles every request that does not go through the render
//! stage:
//! - Building the shared HTTP client with the fixed browser-like header set
//! - The single fallback GET issued when rendering a seed fails
//! - Downloads of file links and direct-file pages

use crate::config::CrawlerConfig;
use crate::page::FallbackPage;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Languages advertised on every plain HTTP request
pub const ACCEPT_LANGUAGE_VALUE: &str = "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7";

/// Referer sent on every plain HTTP request
pub const REFERER_VALUE: &str = "https://www.google.com/";

/// Maximum redirect hops followed by the shared client
const MAX_REDIRECTS: usize = 10;

/// Result of a file download
///
/// A failed download is represented by an empty body and no status, never by
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Download {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub status: Option<u16>,
}

impl Download {
    /// True when there is nothing worth persisting
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Builds the shared HTTP client
///
/// The client sends the configured user agent together with a fixed
/// `Accept-Language` and `Referer`, follows a limited number of redirects and
/// applies the configured per-request timeout.
///
/// # Example
///
/// ```
/// use corpus_harvest::config::CrawlerConfig;
/// use corpus_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );
    headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));

    Client::builder()
        .user_agent(config.user_agent())
        .default_headers(headers)
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

fn content_type_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Fetches a seed with one plain GET
///
/// Any HTTP status counts as a fetched page; only transport failures (connect
/// errors, timeouts, unreadable bodies) are errors. The page keeps the
/// requested URL so it matches the seed it stands in for.
pub async fn fetch_fallback(client: &Client, url: &str) -> Result<FallbackPage, reqwest::Error> {
    let response = client.get(url).send().await?;

    let status = response.status().as_u16();
    let content_type = content_type_of(&response);
    let body = response.bytes().await?.to_vec();

    tracing::debug!(
        "Fallback GET {} -> status={} ({} bytes)",
        url,
        status,
        body.len()
    );

    Ok(FallbackPage {
        url: url.to_string(),
        status,
        content_type,
        body,
    })
}

/// Downloads a file
///
/// Failures of any kind come back as an empty [`Download`].
pub async fn download_file(client: &Client, url: &str) -> Download {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Download of {} failed: {}", url, e);
            return Download::default();
        }
    };

    let status = response.status().as_u16();
    let content_type = content_type_of(&response);

    match response.bytes().await {
        Ok(body) => Download {
            body: body.to_vec(),
            content_type,
            status: Some(status),
        },
        Err(e) => {
            tracing::debug!("Reading body of {} failed: {}", url, e);
            Download::default()
        }
    }
}
