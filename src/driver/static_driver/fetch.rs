//! HTTP layer of the static driver
//!
//! This module handles the raw HTTP exchanges, including:
//! - Building the HTTP client
//! - Sending one request hop with explicit headers
//! - Converting reqwest responses into driver response heads
//! - Resolving redirect targets
//!
//! Redirects are never followed by reqwest itself; the driver walks them hop
//! by hop so each hop can be intercepted and recorded in the redirect chain.

use crate::driver::types::{HeaderMap, ResponseHead};
use crate::{DriverError, DriverResult};
use reqwest::{redirect::Policy, Client, Method};
use std::time::Duration;
use url::Url;

/// Default user agent when neither the crawl nor an emulated device sets one
pub const DEFAULT_USER_AGENT: &str = concat!("sumi-page/", env!("CARGO_PKG_VERSION"));

/// Maximum redirect hops per document, matching Chromium's limit
pub const MAX_REDIRECTS: usize = 20;

/// Result of a single HTTP exchange
#[derive(Debug)]
pub struct Hop {
    pub head: ResponseHead,
    pub body: String,
}

/// Builds the HTTP client used by the static driver
///
/// # Example
///
/// ```no_run
/// use sumi_page::driver::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    // The user agent travels with each request so it shows up in the record
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none()) // Redirects are walked hop by hop
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends one request and reads the full body
pub async fn send(
    client: &Client,
    method: &str,
    url: &Url,
    headers: &HeaderMap,
) -> DriverResult<Hop> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| DriverError::Protocol(format!("Invalid HTTP method '{}'", method)))?;

    let mut request = client.request(method, url.clone());
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let response_headers = collect_headers(response.headers());
    let body = response.text().await?;

    Ok(Hop {
        head: ResponseHead {
            url: final_url,
            status,
            headers: response_headers,
        },
        body,
    })
}

/// Flattens reqwest headers into a map, joining repeated headers with ", "
fn collect_headers(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut collected = HeaderMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

/// Redirect target of a response, resolved against the request URL
///
/// Returns None when the response is not a followable redirect: not 3xx,
/// 304 Not Modified, or no usable `Location` header.
pub fn redirect_target(head: &ResponseHead, request_url: &Url) -> Option<Url> {
    if !head.is_redirect() || head.status == 304 {
        return None;
    }

    let location = head.headers.get("location")?.trim();
    if location.is_empty() {
        return None;
    }

    request_url.join(location).ok()
}

/// Returns true when the server asks for HTTP Basic credentials
pub fn wants_basic_auth(head: &ResponseHead) -> bool {
    head.status == 401
        && head
            .headers
            .get("www-authenticate")
            .map(|challenge| challenge.to_ascii_lowercase().starts_with("basic"))
            .unwrap_or(false)
}
