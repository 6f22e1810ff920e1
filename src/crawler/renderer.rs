//! Render stage abstraction
//!
//! A [`RenderEngine`] takes a seed URL and returns whatever JSON document the
//! engine produces; the page module coerces that document into page records.
//! Engine-specific option names live in each engine's own translation type,
//! so [`RenderOptions`] stays a plain typed struct.

use crate::config::CrawlerConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a render attempt
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no render engine configured")]
    Unavailable,

    #[error("render request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("render service returned status {0}")]
    Status(u16),

    #[error("render engine reported failure: {0}")]
    Engine(String),
}

/// Options handed to the render stage for one seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub max_pages: u32,
    pub max_depth: u32,
    pub concurrency: u32,
    pub timeout_ms: u64,
    pub render_js: bool,
    pub obey_robots_txt: bool,
    pub follow_sitemaps: bool,
    pub respect_crawl_delay: bool,
    pub extract_links: bool,
    pub save_html: bool,
    /// Always fetch live content instead of an engine-side cache
    pub bypass_cache: bool,
    pub user_agent: String,
    pub allowed_domains: Vec<String>,
}

impl RenderOptions {
    pub fn from_config(config: &CrawlerConfig, allowed_domains: &[String]) -> Self {
        Self {
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            concurrency: config.concurrency,
            timeout_ms: config.timeout_ms,
            render_js: config.render_js,
            obey_robots_txt: config.obey_robots_txt,
            follow_sitemaps: config.follow_sitemaps,
            respect_crawl_delay: config.respect_crawl_delay,
            extract_links: config.extract_links,
            save_html: config.save_html,
            bypass_cache: true,
            user_agent: config.user_agent().to_string(),
            allowed_domains: allowed_domains.to_vec(),
        }
    }
}

/// A JavaScript-capable fetcher
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &str;

    /// Renders `url` and returns the engine's result document
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<Value, RenderError>;
}

/// Engine used when no render service is configured
///
/// Every attempt fails, which sends each seed straight to the HTTP fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

#[async_trait]
impl RenderEngine for NoRenderer {
    fn name(&self) -> &str {
        "none"
    }

    async fn render(&self, _url: &str, _options: &RenderOptions) -> Result<Value, RenderError> {
        Err(RenderError::Unavailable)
    }
}

/// A `{"type": ..., "params": ...}` object as the service deserializes it
#[derive(Debug, Serialize)]
struct Typed<T> {
    #[serde(rename = "type")]
    kind: &'static str,
    params: T,
}

impl<T> Typed<T> {
    fn new(kind: &'static str, params: T) -> Self {
        Self { kind, params }
    }
}

/// `crawler_config.params` for a crawl4ai-style service
///
/// Only fields the service's run config accepts are sent. Depth and page
/// limits go into a breadth-first deep crawl strategy. `render_js`,
/// `follow_sitemaps`, `respect_crawl_delay`, `extract_links` and `save_html`
/// have no counterpart there: the service always renders and always returns
/// HTML and links.
#[derive(Debug, Serialize)]
struct RemoteRunParams<'a> {
    page_timeout: u64,
    semaphore_count: u32,
    check_robots_txt: bool,
    user_agent: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_mode: Option<Typed<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deep_crawl_strategy: Option<Typed<DeepCrawlParams<'a>>>,
}

#[derive(Debug, Serialize)]
struct DeepCrawlParams<'a> {
    max_depth: u32,
    max_pages: u32,
    include_external: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter_chain: Option<Typed<FilterChainParams<'a>>>,
}

#[derive(Debug, Serialize)]
struct FilterChainParams<'a> {
    filters: Vec<Typed<DomainFilterParams<'a>>>,
}

#[derive(Debug, Serialize)]
struct DomainFilterParams<'a> {
    allowed_domains: &'a [String],
}

impl<'a> From<&'a RenderOptions> for RemoteRunParams<'a> {
    fn from(options: &'a RenderOptions) -> Self {
        let domains = &options.allowed_domains;
        let filter_chain = (!domains.is_empty()).then(|| {
            Typed::new(
                "FilterChain",
                FilterChainParams {
                    filters: vec![Typed::new(
                        "DomainFilter",
                        DomainFilterParams {
                            allowed_domains: domains,
                        },
                    )],
                },
            )
        });

        // Depth 0 means the seed page alone
        let deep_crawl_strategy = (options.max_depth > 0).then(|| {
            Typed::new(
                "BFSDeepCrawlStrategy",
                DeepCrawlParams {
                    max_depth: options.max_depth,
                    max_pages: options.max_pages,
                    include_external: filter_chain.is_some(),
                    filter_chain,
                },
            )
        });

        Self {
            page_timeout: options.timeout_ms,
            semaphore_count: options.concurrency,
            check_robots_txt: options.obey_robots_txt,
            user_agent: &options.user_agent,
            cache_mode: options
                .bypass_cache
                .then(|| Typed::new("CacheMode", "bypass")),
            deep_crawl_strategy,
        }
    }
}

/// Client for a crawl4ai-compatible render service (`POST {endpoint}/crawl`)
#[derive(Debug, Clone)]
pub struct RemoteRenderer {
    client: Client,
    endpoint: String,
}

impl RemoteRenderer {
    /// Creates a client for the service at `endpoint`
    ///
    /// No total request timeout is set: a render call may crawl many pages,
    /// and the per-page timeout travels in the request itself.
    pub fn new(endpoint: &str) -> Result<Self, RenderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn request_body(url: &str, options: &RenderOptions) -> Value {
        json!({
            "urls": [url],
            "crawler_config": {
                "type": "CrawlerRunConfig",
                "params": RemoteRunParams::from(options),
            },
        })
    }
}

#[async_trait]
impl RenderEngine for RemoteRenderer {
    fn name(&self) -> &str {
        "remote"
    }

    async fn render(&self, url: &str, options: &RenderOptions) -> Result<Value, RenderError> {
        let response = self
            .client
            .post(format!("{}/crawl", self.endpoint))
            .json(&Self::request_body(url, options))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let document: Value = response.json().await?;

        if document.get("success").and_then(Value::as_bool) == Some(false) {
            let reason = document
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error")
                .to_string();
            return Err(RenderError::Engine(reason));
        }

        Ok(document)
    }
}

/// Picks the engine for a configured endpoint
pub fn engine_for(endpoint: Option<&str>) -> Result<Box<dyn RenderEngine>, RenderError> {
    match endpoint {
        Some(endpoint) => Ok(Box::new(RemoteRenderer::new(endpoint)?)),
        None => Ok(Box::new(NoRenderer)),
    }
}
