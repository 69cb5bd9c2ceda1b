use url::Url;

/// Returns true when both URLs share scheme, host and port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_page::url::same_origin;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("https://example.com:443/b?q=1").unwrap();
/// assert!(same_origin(&a, &b));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin() && a.origin().is_tuple()
}

/// Returns true when two URL strings name the same document
///
/// Both sides are parsed so that equivalent spellings compare equal
/// (`http://example.com` and `http://EXAMPLE.com/`). Fragments are ignored;
/// they never reach the network. Unparseable input falls back to exact
/// string comparison.
pub fn same_document(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        _ => a == b,
    }
}
