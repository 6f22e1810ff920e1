//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the harvest loop that ties the pipeline together:
//! - Preparing the output layout, attempt log and frontier
//! - Expanding seeds from sitemaps
//! - Running the render/fallback stage machine per seed
//! - Filtering pages through the frontier and scope policy
//! - Persisting pages, linked files and direct files with their sidecars
//! - Checkpointing the frontier

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, download_file, fetch_fallback};
use crate::crawler::renderer::{engine_for, RenderEngine, RenderOptions};
use crate::crawler::sitemap::expand_seeds;
use crate::output::RunSummary;
use crate::page::{coerce_pages, extension_for_content_type, FetchedPage, Page, ResourceKind};
use crate::state::FetchStage;
use crate::storage::{
    Admission, ArtifactMeta, ArtifactStore, AttemptLog, Frontier, PersistWarning, StorageError,
};
use crate::url::{looks_like_file, resolve_link, PolicyDecision, ScopePolicy};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Counters {
    fetched: AtomicUsize,
    html_saved: AtomicUsize,
    files_saved: AtomicUsize,
    seeds_skipped: AtomicUsize,
    file_errors: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Main harvest coordinator
///
/// Holds everything one run needs. All methods take `&self`, so several seeds
/// can be in flight at once when `seed-workers` is above 1.
pub struct Coordinator {
    config: Config,
    policy: ScopePolicy,
    client: Client,
    renderer: Box<dyn RenderEngine>,
    render_options: RenderOptions,
    seed_expansion: bool,
    frontier: Frontier,
    store: ArtifactStore,
    attempt_log: AttemptLog,
    counters: Counters,
    warnings: Mutex<Vec<PersistWarning>>,
    seed_count: AtomicUsize,
    started_at: DateTime<Utc>,
}

impl Coordinator {
    /// Creates a coordinator using the render engine named by the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvest configuration
    /// * `fresh` - Ignore the saved frontier and start from an empty one
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Output layout prepared, frontier loaded
    /// * `Err(HarvestError)` - Directories, log file or HTTP client could not be set up
    pub fn new(config: Config, fresh: bool) -> Result<Self, HarvestError> {
        let renderer = engine_for(config.renderer.endpoint.as_deref())?;
        Self::with_renderer(config, renderer, fresh)
    }

    /// Creates a coordinator around a specific render engine
    pub fn with_renderer(
        config: Config,
        renderer: Box<dyn RenderEngine>,
        fresh: bool,
    ) -> Result<Self, HarvestError> {
        let policy = ScopePolicy::new(&config.scope)?;
        let client = build_http_client(&config.crawler)?;
        let render_options = RenderOptions::from_config(&config.crawler, policy.allowed_domains());
        let seed_expansion = config.crawler.follow_sitemaps;

        let store = ArtifactStore::create(&config.output)?;
        let attempt_log = AttemptLog::open(&config.output.log_path)?;

        let mut warnings = Vec::new();
        let frontier = if fresh {
            tracing::info!("Starting fresh: ignoring saved frontier");
            Frontier::empty(&config.output.frontier_path)
        } else {
            let (frontier, warning) = Frontier::load(&config.output.frontier_path);
            warnings.extend(warning);
            frontier
        };

        tracing::info!(
            "Render engine: {}, {} URLs already seen",
            renderer.name(),
            frontier.len()
        );

        Ok(Self {
            config,
            policy,
            client,
            renderer,
            render_options,
            seed_expansion,
            frontier,
            store,
            attempt_log,
            counters: Counters::default(),
            warnings: Mutex::new(warnings),
            seed_count: AtomicUsize::new(0),
            started_at: Utc::now(),
        })
    }

    /// Turns sitemap expansion of the seeds on or off
    ///
    /// Only affects [`Coordinator::resolve_seeds`]. The render engine still
    /// receives `follow-sitemaps` from the configuration.
    pub fn set_seed_expansion(&mut self, enabled: bool) {
        self.seed_expansion = enabled;
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Runs the harvest over every seed and returns the run summary
    ///
    /// Nothing in here is fatal: failed fetches and failed writes are logged,
    /// counted, and the run moves on.
    pub async fn run(&self) -> RunSummary {
        let seeds = self.resolve_seeds().await;
        self.seed_count.store(seeds.len(), Ordering::SeqCst);

        let workers = self.config.crawler.seed_workers.max(1) as usize;
        tracing::info!("Harvesting {} seeds with {} worker(s)", seeds.len(), workers);

        stream::iter(seeds)
            .for_each_concurrent(workers, |seed| async move {
                self.process_seed(&seed).await;
            })
            .await;

        self.checkpoint();
        let summary = self.summary();

        tracing::info!(
            "Harvest complete: fetched={}, html saved={}, files saved={}",
            summary.fetched,
            summary.html_saved,
            summary.files_saved
        );

        summary
    }

    /// Configured seeds, expanded from sitemaps when enabled
    pub async fn resolve_seeds(&self) -> Vec<String> {
        let seeds = &self.config.scope.seeds;
        if !self.seed_expansion {
            return seeds.clone();
        }
        expand_seeds(&self.client, seeds, self.policy.allowed_domains()).await
    }

    /// Writes the frontier to disk, recording a warning on failure
    pub fn checkpoint(&self) {
        match self.frontier.save() {
            Ok(count) => tracing::debug!("Frontier checkpoint: {} URLs", count),
            Err(warning) => self.warn(warning),
        }
    }

    /// Snapshot of the counters and warnings so far
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            finished_at: Utc::now(),
            seeds: self.seed_count.load(Ordering::SeqCst),
            fetched: Counters::get(&self.counters.fetched),
            html_saved: Counters::get(&self.counters.html_saved),
            files_saved: Counters::get(&self.counters.files_saved),
            seeds_skipped: Counters::get(&self.counters.seeds_skipped),
            file_errors: Counters::get(&self.counters.file_errors),
            warnings: self.lock_warnings().clone(),
        }
    }

    async fn process_seed(&self, seed: &str) {
        let fetched = self.fetch_seed(seed).await;
        tracing::debug!("Seed {} -> {} page(s)", seed, fetched.len());

        for source in &fetched {
            match Page::from_source(source) {
                Some(page) => self.process_page(page).await,
                None => tracing::debug!("Skipping page record without URL from seed {}", seed),
            }
        }
    }

    /// Runs the render/fallback stage machine for one seed
    ///
    /// Exactly one render attempt and at most one fallback attempt are made.
    /// A seed that fails both yields no pages.
    pub async fn fetch_seed(&self, seed: &str) -> Vec<FetchedPage> {
        let mut stage = FetchStage::AttemptRender;

        let (rendered, render_failure) =
            match self.renderer.render(seed, &self.render_options).await {
                Ok(document) => (coerce_pages(document), None),
                Err(e) => {
                    tracing::warn!("Render failed for {}: {}", seed, e);
                    (Vec::new(), Some(e.to_string()))
                }
            };

        advance(&mut stage, FetchStage::after_render(rendered.len()), seed);
        if stage == FetchStage::Normalize {
            return rendered.into_iter().map(FetchedPage::Rendered).collect();
        }

        tracing::info!("Attempting HTTP fallback for {}", seed);
        let fallback = fetch_fallback(&self.client, seed).await;
        advance(&mut stage, FetchStage::after_fallback(fallback.is_ok()), seed);

        match fallback {
            Ok(page) => {
                tracing::info!("HTTP fallback succeeded for {} (status={})", seed, page.status);
                if let Some(reason) = render_failure {
                    self.record(&format!("RenderError {}", seed), &reason);
                }
                vec![FetchedPage::Fallback(page)]
            }
            Err(e) => {
                tracing::warn!("HTTP fallback also failed for {}: {}", seed, e);
                Counters::bump(&self.counters.seeds_skipped);
                let render = render_failure.unwrap_or_else(|| "no pages".to_string());
                self.record(
                    &format!("SeedSkipped {}", seed),
                    &format!("render: {}; fallback: {}", render, e),
                );
                Vec::new()
            }
        }
    }

    /// Filters one page and sends it down the navigable or direct-file path
    async fn process_page(&self, page: Page) {
        if self.frontier.contains(&page.url) {
            tracing::debug!("Skipping already seen {}", page.url);
            return;
        }

        match self.policy.evaluate(&page.url) {
            PolicyDecision::Rejected => {
                tracing::debug!("Filtered by patterns: {}", page.url);
                return;
            }
            PolicyDecision::AllowedByDomain => {
                tracing::debug!("Allowed by domain override: {}", page.url);
            }
            PolicyDecision::Allowed => {}
        }

        let ordinal = match self.frontier.admit(&page.url) {
            Admission::Accepted { ordinal } => ordinal,
            Admission::AlreadySeen => return,
        };
        Counters::bump(&self.counters.fetched);

        match page.kind() {
            ResourceKind::Navigable => self.handle_navigable(&page).await,
            ResourceKind::DirectFile => self.handle_direct_file(&page).await,
        }

        if Frontier::checkpoint_due(ordinal) {
            self.checkpoint();
        }
    }

    async fn handle_navigable(&self, page: &Page) {
        let html_path = match page.html.as_deref().filter(|html| !html.is_empty()) {
            Some(html) => match self.store.save_html(&page.url, html) {
                Ok(path) => {
                    Counters::bump(&self.counters.html_saved);
                    Some(path)
                }
                Err(e) => {
                    self.warn_artifact(&page.url, e);
                    None
                }
            },
            None => None,
        };

        let links = page.links();

        let mut meta = ArtifactMeta::new(&page.url);
        meta.status = page.status;
        meta.content_type = page.content_type.clone();
        meta.html_path = html_path.as_deref().map(path_string);
        meta.out_links = links.clone();
        meta.domain = page.domain.clone();
        self.write_sidecar(&self.store.page_sidecar_path(&page.url), &meta);

        self.download_links(page, &links).await;

        self.record(&page.url, &status_detail(page.status));
    }

    /// Downloads every file-like link of a page, in order
    async fn download_links(&self, page: &Page, links: &[String]) {
        let extensions = &self.config.scope.file_extensions;

        for link in links.iter().filter(|l| looks_like_file(l, extensions)) {
            let Some(file_url) = resolve_link(&page.url, link) else {
                tracing::debug!("Cannot resolve {} against {}", link, page.url);
                continue;
            };

            let download = download_file(&self.client, &file_url).await;
            if download.is_empty() {
                Counters::bump(&self.counters.file_errors);
                self.record(&format!("FileError {}", file_url), "empty/failed");
                continue;
            }

            let ext = extension_for_content_type(download.content_type.as_deref());
            let file_path = match self.store.save_file(&file_url, ext, &download.body) {
                Ok(path) => path,
                Err(e) => {
                    self.warn_artifact(&file_url, e);
                    continue;
                }
            };
            Counters::bump(&self.counters.files_saved);

            let mut meta = ArtifactMeta::new(&file_url);
            meta.status = download.status;
            meta.content_type = download.content_type;
            meta.file_path = Some(path_string(&file_path));
            meta.domain = page.domain.clone();
            meta.notes = Some(format!("discovered from {}", page.url));
            self.write_sidecar(&self.store.file_sidecar_path(&file_url, ext), &meta);
        }
    }

    async fn handle_direct_file(&self, page: &Page) {
        let (body, content_type, status) = match page.body.as_ref().filter(|b| !b.is_empty()) {
            Some(body) => (body.clone(), page.content_type.clone(), page.status),
            None => {
                let download = download_file(&self.client, &page.url).await;
                (download.body, download.content_type, download.status)
            }
        };

        let mut meta = ArtifactMeta::new(&page.url);
        meta.status = status;
        meta.domain = page.domain.clone();

        if body.is_empty() {
            meta.content_type = content_type;
            meta.notes = Some("empty binary".to_string());
            self.record(&format!("DirectFileError {}", page.url), "empty binary");
            self.write_sidecar(&self.store.page_sidecar_path(&page.url), &meta);
            return;
        }

        let ext = extension_for_content_type(content_type.as_deref());
        meta.content_type = content_type;

        match self.store.save_file(&page.url, ext, &body) {
            Ok(path) => {
                Counters::bump(&self.counters.files_saved);
                meta.file_path = Some(path_string(&path));
            }
            Err(e) => self.warn_artifact(&page.url, e),
        }
        self.write_sidecar(&self.store.file_sidecar_path(&page.url, ext), &meta);

        self.record(&page.url, &status_detail(status));
    }

    fn write_sidecar(&self, path: &Path, meta: &ArtifactMeta) {
        if let Err(e) = self.store.write_sidecar(path, meta) {
            self.warn_artifact(&meta.url, e);
        }
    }

    fn record(&self, context: &str, detail: &str) {
        if let Err(warning) = self.attempt_log.record(context, detail) {
            self.warn(warning);
        }
    }

    fn warn_artifact(&self, url: &str, error: StorageError) {
        self.warn(PersistWarning::Artifact {
            url: url.to_string(),
            reason: error.to_string(),
        });
    }

    fn warn(&self, warning: PersistWarning) {
        tracing::warn!("{}", warning);
        self.lock_warnings().push(warning);
    }

    fn lock_warnings(&self) -> std::sync::MutexGuard<'_, Vec<PersistWarning>> {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Moves the stage machine forward, logging illegal transitions
fn advance(stage: &mut FetchStage, next: FetchStage, seed: &str) {
    if !stage.can_transition_to(next) {
        tracing::error!("Illegal fetch stage transition {} -> {} for {}", stage, next, seed);
    }
    tracing::trace!("{}: {} -> {}", seed, stage, next);
    *stage = next;
}

fn status_detail(status: Option<u16>) -> String {
    match status {
        Some(code) => format!("status={}", code),
        None => "status=unknown".to_string(),
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Runs a complete harvest with the configured render engine
///
/// # Example
///
/// ```no_run
/// use corpus_harvest::config::load_config;
/// use corpus_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let summary = run_harvest(config, false).await?;
/// println!("{} pages fetched", summary.fetched);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, fresh: bool) -> Result<RunSummary, HarvestError> {
    let coordinator = Coordinator::new(config, fresh)?;
    Ok(coordinator.run().await)
}
