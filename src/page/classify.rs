/// Which pipeline path a page takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// HTML: save the body, harvest links, download linked files
    Navigable,
    /// Anything else: save the bytes as a file
    DirectFile,
}

/// True if there is HTML text or the content type says HTML
pub fn is_html(html: Option<&str>, content_type: Option<&str>) -> bool {
    if html.is_some_and(|h| !h.trim().is_empty()) {
        return true;
    }
    content_type.is_some_and(|ct| ct.to_lowercase().contains("html"))
}

/// Maps a content type to the extension used for saved files
///
/// Substrings are checked in a fixed order, so e.g. a content type mentioning
/// both `pdf` and `html` maps to `.pdf`.
///
/// # Examples
///
/// ```
/// use corpus_harvest::page::extension_for_content_type;
///
/// assert_eq!(extension_for_content_type(Some("application/pdf")), ".pdf");
/// assert_eq!(extension_for_content_type(Some("text/html; charset=utf-8")), ".html");
/// assert_eq!(extension_for_content_type(None), ".bin");
/// ```
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let Some(ct) = content_type else {
        return ".bin";
    };
    let ct = ct.to_lowercase();

    if ct.contains("pdf") {
        ".pdf"
    } else if ct.contains("msword") || ct.contains("officedocument.wordprocessingml") {
        ".docx"
    } else if ct.contains("html") {
        ".html"
    } else if ct.contains("spreadsheet") || ct.contains("excel") {
        ".xlsx"
    } else if ct.contains("presentation") || ct.contains("powerpoint") {
        ".pptx"
    } else {
        ".bin"
    }
}
