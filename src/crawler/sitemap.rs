//! Seed expansion from well-known sitemap locations

use crate::url::{domain_of, matches_any_domain};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

/// Paths probed under every seed root, in order
pub const SITEMAP_PATHS: [&str; 4] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap",
];

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

fn loc_regex() -> &'static Regex {
    static LOC: OnceLock<Regex> = OnceLock::new();
    LOC.get_or_init(|| Regex::new(r"<loc>\s*([^<\s]+)\s*</loc>").expect("valid loc regex"))
}

/// Extracts every `<loc>` value from a sitemap document
pub fn extract_locations(xml: &str) -> Vec<String> {
    loc_regex()
        .captures_iter(xml)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Probes one sitemap URL; any failure or non-XML answer yields nothing
async fn probe(client: &Client, url: &str) -> Vec<String> {
    let response = match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Sitemap probe {} failed: {}", url, e);
            return Vec::new();
        }
    };

    let is_xml = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_lowercase().contains("xml"));

    if response.status() != StatusCode::OK || !is_xml {
        return Vec::new();
    }

    match response.text().await {
        Ok(xml) => extract_locations(&xml),
        Err(e) => {
            tracing::debug!("Sitemap body {} unreadable: {}", url, e);
            Vec::new()
        }
    }
}

/// Adds sitemap locations under the allowed domains to the seed list
///
/// Seeds keep their order and come first; new locations follow in discovery
/// order, and duplicates are dropped. With no allowed domains nothing is
/// added.
pub async fn expand_seeds(client: &Client, seeds: &[String], allowed_domains: &[String]) -> Vec<String> {
    let mut discovered = Vec::new();
    for root in seeds {
        let root = root.trim_end_matches('/');
        for path in SITEMAP_PATHS {
            discovered.extend(probe(client, &format!("{}{}", root, path)).await);
        }
    }

    let in_scope = discovered.into_iter().filter(|loc| {
        domain_of(loc).is_some_and(|host| matches_any_domain(allowed_domains, &host))
    });

    let mut seen = HashSet::new();
    let merged: Vec<String> = seeds
        .iter()
        .cloned()
        .chain(in_scope)
        .filter(|url| seen.insert(url.clone()))
        .collect();

    tracing::info!(
        "Seeds after sitemap expansion: {} (added {})",
        merged.len(),
        merged.len() - seeds.len().min(merged.len())
    );

    merged
}
