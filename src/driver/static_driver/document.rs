//! HTML inspection for the static driver
//!
//! This module turns fetched HTML into the driver's frame view:
//! - Raw `href` values of every `<a href>` element
//! - `<frame>`/`<iframe>` elements with their raw `src` and a frame id
//! - Selector presence checks for wait gates

use crate::driver::frames::{FrameDocument, FrameElement, FrameId};
use crate::{DriverError, DriverResult};
use scraper::{Html, Selector};
use url::Url;

const ANCHOR_SELECTOR: &str = "a[href]";
const FRAME_SELECTOR: &str = "frame, iframe";

/// Parses HTML content into a frame document
///
/// Hrefs are returned exactly as written; resolving them is the link
/// collector's job. A nested frame gets an id (its absolute URL) only when
/// its `src` resolves to an HTTP(S) URL; other frames (`about:blank`,
/// `srcdoc`, `javascript:`) have no fetchable document.
///
/// # Example
///
/// ```ignore
/// let url = Url::parse("https://example.com/").unwrap();
/// let document = parse_frame_document(r#"<a href="/page">Link</a>"#, &url);
/// assert_eq!(document.hrefs, vec!["/page".to_string()]);
/// ```
pub fn parse_frame_document(html: &str, url: &Url) -> FrameDocument {
    let document = Html::parse_document(html);

    FrameDocument {
        url: url.to_string(),
        hrefs: extract_hrefs(&document),
        frames: extract_frames(&document, url),
    }
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(ANCHOR_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

fn extract_frames(document: &Html, url: &Url) -> Vec<FrameElement> {
    let Ok(selector) = Selector::parse(FRAME_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| {
            let src = element.value().attr("src").map(str::to_string);
            let frame = src
                .as_deref()
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .and_then(|src| url.join(src).ok())
                .filter(|resolved| resolved.scheme() == "http" || resolved.scheme() == "https")
                .map(|resolved| FrameId::new(resolved.to_string()));
            FrameElement { src, frame }
        })
        .collect()
}

/// Returns true when `selector` matches at least one element of the document
pub fn matches_selector(html: &str, selector: &str) -> DriverResult<bool> {
    let parsed = Selector::parse(selector)
        .map_err(|e| DriverError::Protocol(format!("Invalid selector '{}': {:?}", selector, e)))?;
    let document = Html::parse_document(html);
    let found = document.select(&parsed).next().is_some();
    Ok(found)
}
