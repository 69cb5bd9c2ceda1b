//! Request interception decisions
//!
//! While interception is enabled, every request the page issues is handed to
//! the registered [`RequestHandler`] and must be answered with exactly one
//! [`RequestDecision`]. Handlers are synchronous so a driver can always reply
//! without waiting on anything else.

use crate::driver::types::{HeaderMap, HttpRequest};

/// Changes applied to a request that is allowed to continue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinueOverrides {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<HeaderMap>,
}

/// Synthetic response answering an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    pub body: String,
}

impl Default for InterceptResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            content_type: None,
            body: String::new(),
        }
    }
}

/// What to do with an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDecision {
    /// Send the request, optionally modified
    Continue(ContinueOverrides),
    /// Answer the request without touching the network
    Respond(InterceptResponse),
    /// Fail the request with a network error code (e.g. "failed", "aborted")
    Abort(String),
}

impl RequestDecision {
    /// Continue without modifications
    pub fn continue_unmodified() -> Self {
        Self::Continue(ContinueOverrides::default())
    }

    /// Answer with status 200 and an empty body
    pub fn respond_empty() -> Self {
        Self::Respond(InterceptResponse::default())
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Abort(reason.into())
    }
}

/// Answers intercepted requests
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: &HttpRequest) -> RequestDecision;
}
