use url::Url;

/// Resolves a hyperlink `href` against a base URL
///
/// Returns None if the link should be excluded:
/// - Empty or whitespace-only hrefs
/// - Hrefs that cannot be parsed relative to the base
/// - Anything that does not resolve to an HTTP(S) URL
///   (`javascript:`, `mailto:`, `tel:`, `data:` ...)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_page::url::resolve_href;
///
/// let base = Url::parse("http://x.com/b/").unwrap();
/// assert_eq!(resolve_href("/a", &base), Some("http://x.com/a".to_string()));
/// assert_eq!(resolve_href("javascript:void(0)", &base), None);
/// assert_eq!(resolve_href("", &base), None);
/// ```
pub fn resolve_href(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}
