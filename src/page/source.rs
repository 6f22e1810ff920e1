use crate::page::normalize::{first_html_text, first_link_array, first_non_empty, TextField};
use crate::page::PageOrigin;
use crate::url::domain_of;
use serde::Deserialize;
use serde_json::Value;

/// Capability interface every fetch source exposes to the pipeline
pub trait PageSource {
    fn url(&self) -> Option<&str>;

    fn status(&self) -> Option<u16>;

    fn content_type(&self) -> Option<&str>;

    /// Resolved HTML text, already wrapped when it came from markdown
    fn html_body(&self) -> Option<String>;

    /// String links reported by the source itself
    fn native_links(&self) -> Vec<String>;

    fn domain(&self) -> Option<String>;

    /// Raw bytes kept for non-textual bodies
    fn raw_body(&self) -> Option<&[u8]>;

    fn origin(&self) -> PageOrigin;
}

/// One page record as returned by the render stage
///
/// Every field is optional; engines only fill in some of them and name them
/// differently between versions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderedPage {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub status_code: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,

    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub html: Option<TextField>,
    #[serde(default)]
    pub rendered_html: Option<TextField>,
    #[serde(default)]
    pub content_html: Option<TextField>,
    #[serde(default)]
    pub cleaned_html: Option<TextField>,
    #[serde(default)]
    pub content: Option<TextField>,
    #[serde(default)]
    pub text: Option<TextField>,
    #[serde(default)]
    pub markdown: Option<TextField>,
    #[serde(default)]
    pub markdown_v2: Option<TextField>,

    #[serde(default)]
    pub out_links: Option<Value>,
    #[serde(default)]
    pub outgoing_urls: Option<Value>,
    #[serde(default)]
    pub links: Option<Value>,
    #[serde(default)]
    pub hrefs: Option<Value>,
    #[serde(default)]
    pub urls: Option<Value>,

    #[serde(default)]
    pub domain: Option<String>,
}

impl PageSource for RenderedPage {
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn status(&self) -> Option<u16> {
        [&self.status_code, &self.status]
            .into_iter()
            .flatten()
            .find_map(|v| v.as_u64().and_then(|n| u16::try_from(n).ok()))
    }

    fn content_type(&self) -> Option<&str> {
        first_non_empty([self.content_type.as_ref(), self.mime_type.as_ref()])
    }

    fn html_body(&self) -> Option<String> {
        first_html_text([
            ("html", self.html.as_ref()),
            ("rendered_html", self.rendered_html.as_ref()),
            ("content_html", self.content_html.as_ref()),
            ("cleaned_html", self.cleaned_html.as_ref()),
            ("content", self.content.as_ref()),
            ("text", self.text.as_ref()),
            ("markdown", self.markdown.as_ref()),
            ("markdown_v2", self.markdown_v2.as_ref()),
        ])
    }

    fn native_links(&self) -> Vec<String> {
        first_link_array([
            self.out_links.as_ref(),
            self.outgoing_urls.as_ref(),
            self.links.as_ref(),
            self.hrefs.as_ref(),
            self.urls.as_ref(),
        ])
    }

    fn domain(&self) -> Option<String> {
        first_non_empty([self.domain.as_ref()])
            .map(str::to_lowercase)
            .or_else(|| self.url.as_deref().and_then(domain_of))
    }

    fn raw_body(&self) -> Option<&[u8]> {
        None
    }

    fn origin(&self) -> PageOrigin {
        PageOrigin::Rendered
    }
}

/// A page captured by the plain HTTP fallback
#[derive(Debug, Clone)]
pub struct FallbackPage {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FallbackPage {
    /// Whether the body should be read as text
    ///
    /// A missing content type is treated as text, which is what servers that
    /// omit the header almost always send.
    fn is_textual(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => {
                let ct = ct.to_lowercase();
                ct.contains("html") || ct.contains("text") || ct.contains("xml")
            }
        }
    }
}

impl PageSource for FallbackPage {
    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn status(&self) -> Option<u16> {
        Some(self.status)
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref().filter(|ct| !ct.trim().is_empty())
    }

    fn html_body(&self) -> Option<String> {
        if !self.is_textual() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.body);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.into_owned())
        }
    }

    fn native_links(&self) -> Vec<String> {
        Vec::new()
    }

    fn domain(&self) -> Option<String> {
        domain_of(&self.url)
    }

    fn raw_body(&self) -> Option<&[u8]> {
        if self.is_textual() || self.body.is_empty() {
            None
        } else {
            Some(self.body.as_slice())
        }
    }

    fn origin(&self) -> PageOrigin {
        PageOrigin::Fallback
    }
}

/// A fetch result from either source
#[derive(Debug, Clone)]
pub enum FetchedPage {
    Rendered(RenderedPage),
    Fallback(FallbackPage),
}

impl FetchedPage {
    fn inner(&self) -> &dyn PageSource {
        match self {
            Self::Rendered(page) => page,
            Self::Fallback(page) => page,
        }
    }
}

impl PageSource for FetchedPage {
    fn url(&self) -> Option<&str> {
        self.inner().url()
    }

    fn status(&self) -> Option<u16> {
        self.inner().status()
    }

    fn content_type(&self) -> Option<&str> {
        self.inner().content_type()
    }

    fn html_body(&self) -> Option<String> {
        self.inner().html_body()
    }

    fn native_links(&self) -> Vec<String> {
        self.inner().native_links()
    }

    fn domain(&self) -> Option<String> {
        self.inner().domain()
    }

    fn raw_body(&self) -> Option<&[u8]> {
        self.inner().raw_body()
    }

    fn origin(&self) -> PageOrigin {
        self.inner().origin()
    }
}
