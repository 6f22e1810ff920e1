use serde::Deserialize;

/// Browser-like user agent sent on every plain HTTP request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Main configuration structure for Corpus-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    pub scope: ScopeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
///
/// Most of these knobs are passed through to the render stage; the harvester
/// itself only uses `timeout_ms`, `follow_sitemaps`, `seed_workers` and
/// `user_agent` directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum pages the render stage may return for one seed
    pub max_pages: u32,

    /// Maximum link depth the render stage may follow from a seed
    pub max_depth: u32,

    /// Concurrency hint for the render stage
    pub concurrency: u32,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    pub render_js: bool,
    pub obey_robots_txt: bool,

    /// Also expands the seed list from well-known sitemap paths
    pub follow_sitemaps: bool,

    pub respect_crawl_delay: bool,
    pub extract_links: bool,
    pub save_html: bool,

    /// Number of seeds processed concurrently (1 = strictly sequential)
    pub seed_workers: u32,

    /// User agent override for both HTTP and the render stage
    pub user_agent: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 150,
            max_depth: 3,
            concurrency: 3,
            timeout_ms: 30_000,
            render_js: true,
            obey_robots_txt: true,
            follow_sitemaps: true,
            respect_crawl_delay: true,
            extract_links: true,
            save_html: true,
            seed_workers: 1,
            user_agent: None,
        }
    }
}

impl CrawlerConfig {
    /// Returns the configured user agent or the built-in browser one
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

/// Render stage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RendererConfig {
    /// Base URL of a crawl4ai-compatible render service; when absent every
    /// seed goes straight to the HTTP fallback
    pub endpoint: Option<String>,
}

/// Harvest scope: seeds and URL policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeConfig {
    pub seeds: Vec<String>,

    /// Regular expressions; a URL must match at least one (when non-empty)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regular expressions; a URL matching any of them is rejected
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Hosts (and their subdomains) that are always in scope
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Link suffixes that mark a downloadable file
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
}

fn default_file_extensions() -> Vec<String> {
    vec![".pdf".to_string(), ".doc".to_string(), ".docx".to_string()]
}

/// Output layout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory receiving `<hash>.html` page bodies
    pub html_dir: String,

    /// Directory receiving downloaded binaries
    pub files_dir: String,

    /// Directory receiving JSON sidecars
    pub meta_dir: String,

    /// Append-only attempt log
    pub log_path: String,

    /// JSON array of already processed URLs
    pub frontier_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html_dir: "output_raw/html".to_string(),
            files_dir: "output_raw/files".to_string(),
            meta_dir: "output_raw/meta".to_string(),
            log_path: "logs/crawl.log".to_string(),
            frontier_path: "logs/seen.json".to_string(),
        }
    }
}
