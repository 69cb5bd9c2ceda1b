//! Crawl request interception
//!
//! While interception is on, the crawl answers every request itself. Document
//! requests that would take the top frame away from the crawl target get an
//! empty answer before the user hook is consulted; everything else goes to
//! the [`PreBrowserRequest`] hook.

use crate::config::CrawlConfig;
use crate::driver::{HttpRequest, RequestDecision, RequestHandler};
use crate::url::same_document;
use std::sync::Arc;

/// Hook deciding the fate of intercepted requests
///
/// Any `Fn(&CrawlConfig, &HttpRequest) -> RequestDecision` closure is a hook.
pub trait PreBrowserRequest: Send + Sync {
    fn decide(&self, config: &CrawlConfig, request: &HttpRequest) -> RequestDecision;
}

impl<F> PreBrowserRequest for F
where
    F: Fn(&CrawlConfig, &HttpRequest) -> RequestDecision + Send + Sync,
{
    fn decide(&self, config: &CrawlConfig, request: &HttpRequest) -> RequestDecision {
        self(config, request)
    }
}

/// Default hook: every request continues unmodified
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinueUnmodified;

impl PreBrowserRequest for ContinueUnmodified {
    fn decide(&self, _config: &CrawlConfig, _request: &HttpRequest) -> RequestDecision {
        RequestDecision::continue_unmodified()
    }
}

/// Request handler installed on the page for the lifetime of a crawl
pub struct CrawlInterceptor {
    config: Arc<CrawlConfig>,
    hook: Arc<dyn PreBrowserRequest>,
}

impl CrawlInterceptor {
    pub fn new(config: Arc<CrawlConfig>, hook: Arc<dyn PreBrowserRequest>) -> Self {
        Self { config, hook }
    }

    /// Whether a request would move the top frame off the crawl target
    fn leaves_target(&self, request: &HttpRequest) -> bool {
        request.resource_type.is_document() && !same_document(&request.url, &self.config.url)
    }
}

impl RequestHandler for CrawlInterceptor {
    fn handle(&self, request: &HttpRequest) -> RequestDecision {
        if self.leaves_target(request) {
            tracing::debug!(
                "Answering off-target document request {} with an empty body",
                request.url
            );
            return RequestDecision::respond_empty();
        }

        self.hook.decide(&self.config, request)
    }
}
