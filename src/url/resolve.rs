use url::Url;

/// Resolves a harvested link against the absolute URL of the page it came from
///
/// Absolute links are returned as-is (after parsing); relative ones are joined
/// onto `base`. Returns `None` when either side cannot be parsed.
///
/// # Examples
///
/// ```
/// use corpus_harvest::url::resolve_link;
///
/// assert_eq!(
///     resolve_link("https://h/x/y", "/a/b.pdf").as_deref(),
///     Some("https://h/a/b.pdf")
/// );
/// ```
pub fn resolve_link(base: &str, link: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(link.trim()).ok().map(|u| u.to_string())
}

/// Returns true if the link text ends with one of the file extensions
///
/// The comparison is case-insensitive on the link; extensions are expected in
/// lowercase.
pub fn looks_like_file(link: &str, extensions: &[String]) -> bool {
    let lower = link.to_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&ext.to_lowercase()))
}
