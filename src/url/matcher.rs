/// Checks if a host falls under an allowed domain
///
/// A host matches when it equals the domain or is any subdomain of it.
/// Both sides are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use corpus_harvest::url::matches_domain;
///
/// assert!(matches_domain("uit.edu.vn", "uit.edu.vn"));
/// assert!(matches_domain("uit.edu.vn", "daa.uit.edu.vn"));
/// assert!(!matches_domain("uit.edu.vn", "notuit.edu.vn"));
/// ```
pub fn matches_domain(domain: &str, host: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Returns true if `host` matches any entry of `domains`
pub fn matches_any_domain(domains: &[String], host: &str) -> bool {
    domains.iter().any(|d| matches_domain(d, host))
}
