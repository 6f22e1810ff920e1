//! Crawler module for fetching and processing seeds
//!
//! This module contains the harvest pipeline, including:
//! - The render stage abstraction and its engines
//! - Plain HTTP fallback fetching and file downloads
//! - Seed expansion from sitemaps
//! - Overall harvest coordination

mod coordinator;
mod fetcher;
mod renderer;
mod sitemap;

pub use coordinator::{run_harvest, Coordinator};
pub use fetcher::{
    build_http_client, download_file, fetch_fallback, Download, ACCEPT_LANGUAGE_VALUE,
    REFERER_VALUE,
};
pub use renderer::{engine_for, NoRenderer, RemoteRenderer, RenderEngine, RenderError, RenderOptions};
pub use sitemap::{expand_seeds, extract_locations, SITEMAP_PATHS};
