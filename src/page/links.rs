use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn attr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:href|src)=["']([^"']+)["']"#).expect("link pattern is valid")
    })
}

/// Scans HTML text for `href="..."` and `src="..."` attribute values
///
/// This is a plain pattern scan, not a DOM walk: values inside scripts or
/// markdown shells are found too, which is what we want for harvesting.
pub fn scan_html_links(html: &str) -> Vec<String> {
    attr_pattern()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Harvests outbound links of a page
///
/// Native links come first, followed by links scanned from the HTML. Entries
/// are trimmed, blank ones dropped, and duplicates removed keeping the first
/// occurrence. Links are returned exactly as written (relative links stay
/// relative).
///
/// # Example
///
/// ```
/// use corpus_harvest::page::harvest_links;
///
/// let native = vec!["/a".to_string(), " /a ".to_string()];
/// let links = harvest_links(&native, Some(r#"<a href="/b">b</a><img src='/a'>"#));
/// assert_eq!(links, vec!["/a", "/b"]);
/// ```
pub fn harvest_links(native: &[String], html: Option<&str>) -> Vec<String> {
    let scanned = html.map(scan_html_links).unwrap_or_default();

    let mut seen = HashSet::new();
    native
        .iter()
        .map(String::as_str)
        .chain(scanned.iter().map(String::as_str))
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .filter(|link| seen.insert(link.to_string()))
        .map(str::to_string)
        .collect()
}
