//! Page model and the adapters that normalize fetch results
//!
//! Fetch results come from two sources with different shapes:
//! - `RenderedPage`: a JSON record produced by the render stage, whose field
//!   names vary between engine versions
//! - `FallbackPage`: a plain HTTP response captured by the fallback fetcher
//!
//! Both implement [`PageSource`], the fixed capability interface the rest of
//! the pipeline reads through. [`Page::from_source`] turns either into the
//! uniform [`Page`] record.

mod classify;
mod links;
mod normalize;
mod source;

pub use classify::{extension_for_content_type, is_html, ResourceKind};
pub use links::{harvest_links, scan_html_links};
pub use normalize::{coerce_pages, TextField};
pub use source::{FallbackPage, FetchedPage, PageSource, RenderedPage};

/// Where a page record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrigin {
    Rendered,
    Fallback,
}

/// A fetched page in uniform shape
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Absolute URL as reported by the fetch source
    pub url: String,

    pub status: Option<u16>,

    pub content_type: Option<String>,

    /// Normalized HTML text, if any candidate field carried text
    pub html: Option<String>,

    /// Links reported natively by the fetch source (not from HTML scanning)
    pub native_links: Vec<String>,

    /// Raw response bytes, when the source kept a non-textual body
    pub body: Option<Vec<u8>>,

    pub domain: Option<String>,

    pub origin: PageOrigin,
}

impl Page {
    /// Builds a page from any fetch source
    ///
    /// Returns `None` when the source carries no URL; such records cannot be
    /// deduplicated or addressed and are skipped by the pipeline.
    pub fn from_source(source: &FetchedPage) -> Option<Self> {
        let url = source.url()?.trim();
        if url.is_empty() {
            return None;
        }

        Some(Self {
            url: url.to_string(),
            status: source.status(),
            content_type: source.content_type().map(str::to_string),
            html: source.html_body(),
            native_links: source.native_links(),
            body: source.raw_body().map(<[u8]>::to_vec),
            domain: source.domain(),
            origin: source.origin(),
        })
    }

    /// True when the page should take the navigable (HTML) path
    pub fn is_html(&self) -> bool {
        is_html(self.html.as_deref(), self.content_type.as_deref())
    }

    /// Routes the page to the navigable or direct-file path
    pub fn kind(&self) -> ResourceKind {
        if self.is_html() {
            ResourceKind::Navigable
        } else {
            ResourceKind::DirectFile
        }
    }

    /// Outbound links: native links unioned with links scanned from the HTML
    pub fn links(&self) -> Vec<String> {
        harvest_links(&self.native_links, self.html.as_deref())
    }
}
