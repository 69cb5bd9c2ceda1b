//! Request and response shapes exchanged with a page driver

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header name -> value mapping
///
/// Names are kept as the driver reports them (lowercase for HTTP/2 style
/// drivers); a sorted map keeps serialized output stable.
pub type HeaderMap = BTreeMap<String, String>;

/// Kind of resource a request loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    TextTrack,
    Xhr,
    Fetch,
    EventSource,
    WebSocket,
    Manifest,
    Other,
}

impl ResourceType {
    /// Returns true for navigation-type requests (top frame or sub-frame documents)
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }
}

/// Status line and headers of a response, without a link back to its request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHead {
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Browser semantics: status 0 (no network response) or 2xx
    pub fn ok(&self) -> bool {
        self.status == 0 || (200..=299).contains(&self.status)
    }

    /// Returns true for 3xx statuses
    pub fn is_redirect(&self) -> bool {
        (300..=399).contains(&self.status)
    }
}

/// A request issued by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Driver-assigned identifier, used to look up the response body
    pub id: String,
    pub url: String,
    pub method: String,
    pub resource_type: ResourceType,
    pub headers: HeaderMap,
    /// Requests that redirected to this one, oldest first
    pub redirect_chain: Vec<HttpRequest>,
    /// Response received for this request, if any
    pub response: Option<ResponseHead>,
}

impl HttpRequest {
    /// Creates a GET request for a document
    pub fn document(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            method: "GET".to_string(),
            resource_type: ResourceType::Document,
            headers: HeaderMap::new(),
            redirect_chain: Vec::new(),
            response: None,
        }
    }
}

/// Final response of a navigation together with the request that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub head: ResponseHead,
    pub request: HttpRequest,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        self.head.ok()
    }

    pub fn url(&self) -> &str {
        &self.head.url
    }

    pub fn status(&self) -> u16 {
        self.head.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }
}

/// Script or library injected into the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptTag {
    /// Load from a URL
    Url(String),
    /// Inline source
    Content(String),
}
