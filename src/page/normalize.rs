//! Field resolution shared by the page adapters
//!
//! Render engines disagree on field names, so each concept is read from an
//! ordered list of candidate fields and the first non-empty one wins.

use crate::page::source::RenderedPage;
use serde::Deserialize;
use serde_json::Value;

/// A text-ish field value as it may appear in a render result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Text(String),
    Bytes(Vec<u8>),
    Other(Value),
}

impl TextField {
    /// Decodes the value to text; byte arrays are decoded as lossy UTF-8
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Self::Other(_) => None,
        }
    }
}

/// Picks the first candidate carrying non-blank text
///
/// Markdown-style fields are wrapped in a `<pre>` shell so that link scanning
/// and the navigable path apply to them like to real HTML.
pub(crate) fn first_html_text<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a TextField>)>,
{
    candidates.into_iter().find_map(|(name, value)| {
        let text = value?.as_text()?;
        if text.trim().is_empty() {
            return None;
        }
        if name.starts_with("markdown") {
            Some(wrap_markdown(&text))
        } else {
            Some(text)
        }
    })
}

/// Picks the first non-blank string
pub(crate) fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|s| !s.trim().is_empty())
}

/// Returns the string entries of the first non-empty link array
pub(crate) fn first_link_array<'a, I>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .find(|items| !items.is_empty())
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn wrap_markdown(markdown: &str) -> String {
    format!("<pre>\n{}\n</pre>", markdown)
}

/// Coerces a render-stage response into page records
///
/// Recognized shapes:
/// - an array of page objects
/// - an object with a `pages` or `results` array
/// - a single page object
///
/// Anything else (null, scalars) yields no pages. Entries that do not
/// deserialize as a page are dropped.
pub fn coerce_pages(response: Value) -> Vec<RenderedPage> {
    let items = match response {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let container = ["pages", "results"]
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::Array(_)) => Some(*key),
                    _ => None,
                });
            match container.and_then(|key| map.remove(key)) {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(map)],
            }
        }
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RenderedPage>(item) {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::debug!("Dropping unreadable render result entry: {}", e);
                None
            }
        })
        .collect()
}
