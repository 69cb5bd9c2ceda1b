//! Page driver abstraction
//!
//! A [`PageDriver`] is one controllable browser page. The crawler only talks
//! to the page through this trait, one method per capability, so any
//! browser-automation backend can sit behind it.
//!
//! Optional capabilities have default implementations that fail with
//! [`DriverError::Unsupported`]. A driver that cannot, say, take screenshots
//! still works for every crawl that does not ask for one.
//!
//! # Components
//!
//! - `types`: requests, responses and headers
//! - `intercept`: request interception decisions
//! - `events`: console, page error and dialog observers
//! - `frames`: frame tree snapshots used by the link collector
//! - `static_driver`: a JavaScript-less driver over plain HTTP
//! - `browser_driver`: a Chromium driver over the DevTools protocol
//!   (`browser` feature)

#[cfg(feature = "browser")]
mod browser_driver;
mod events;
mod frames;
mod intercept;
mod static_driver;
mod types;

pub use events::{
    resolve_dialog, ConsoleLevel, ConsoleMessage, Dialog, DialogAction, DialogKind, PageObserver,
};
pub use frames::{FrameDocument, FrameElement, FrameId};
pub use intercept::{ContinueOverrides, InterceptResponse, RequestDecision, RequestHandler};
#[cfg(feature = "browser")]
pub use browser_driver::{BrowserDriver, BrowserOptions};
pub use static_driver::{build_http_client, StaticDriver, DEFAULT_USER_AGENT};
pub use types::{HeaderMap, HttpRequest, HttpResponse, ResourceType, ResponseHead, ScriptTag};

use crate::config::{Credentials, DeviceProfile, NavigationOptions, ScreenshotOptions, WaitOptions};
use crate::{DriverError, DriverResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// One controllable page
///
/// A driver is owned by a single crawl at a time. Methods take `&self` so
/// independent operations can run concurrently against the same page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates the page and returns the final response
    async fn navigate(&self, url: &str, options: &NavigationOptions)
        -> DriverResult<HttpResponse>;

    /// Full body of a response received by this page
    async fn response_text(&self, response: &HttpResponse) -> DriverResult<String>;

    /// Top-level frame of the currently loaded document
    async fn main_frame(&self) -> DriverResult<FrameId>;

    /// Snapshot of a frame's document
    ///
    /// Fails with [`DriverError::FrameAccess`] when the frame's document is
    /// not reachable from the top document (cross-origin).
    async fn frame_document(&self, frame: &FrameId) -> DriverResult<FrameDocument>;

    /// Registers the handler that answers intercepted requests
    fn set_request_handler(&self, handler: Arc<dyn RequestHandler>);

    /// Registers an observer for console, error and dialog events
    fn add_observer(&self, observer: Arc<dyn PageObserver>);

    /// Evaluates a JavaScript function in the page with JSON arguments
    async fn evaluate(&self, _function: &str, _args: &[Value]) -> DriverResult<Value> {
        Err(DriverError::Unsupported("script evaluation"))
    }

    /// Registers a script that runs before every future document load
    async fn evaluate_on_new_document(&self, _source: &str) -> DriverResult<()> {
        Err(DriverError::Unsupported("init scripts"))
    }

    async fn authenticate(&self, _credentials: &Credentials) -> DriverResult<()> {
        Err(DriverError::Unsupported("HTTP authentication"))
    }

    async fn emulate(&self, _device: &DeviceProfile) -> DriverResult<()> {
        Err(DriverError::Unsupported("device emulation"))
    }

    async fn set_cache_enabled(&self, _enabled: bool) -> DriverResult<()> {
        Err(DriverError::Unsupported("cache control"))
    }

    async fn set_user_agent(&self, _user_agent: &str) -> DriverResult<()> {
        Err(DriverError::Unsupported("user agent override"))
    }

    async fn set_extra_headers(&self, _headers: &HeaderMap) -> DriverResult<()> {
        Err(DriverError::Unsupported("extra headers"))
    }

    async fn set_javascript_enabled(&self, _enabled: bool) -> DriverResult<()> {
        Err(DriverError::Unsupported("JavaScript toggling"))
    }

    /// Once enabled, every request must be answered by the request handler
    async fn set_request_interception(&self, _enabled: bool) -> DriverResult<()> {
        Err(DriverError::Unsupported("request interception"))
    }

    async fn wait_for_selector(&self, _selector: &str, _options: &WaitOptions) -> DriverResult<()> {
        Err(DriverError::Unsupported("selector waits"))
    }

    async fn wait_for_function(
        &self,
        _function: &str,
        _options: &WaitOptions,
        _args: &[Value],
    ) -> DriverResult<()> {
        Err(DriverError::Unsupported("function waits"))
    }

    async fn screenshot(&self, _options: &ScreenshotOptions) -> DriverResult<Vec<u8>> {
        Err(DriverError::Unsupported("screenshots"))
    }

    async fn add_script_tag(&self, _tag: &ScriptTag) -> DriverResult<()> {
        Err(DriverError::Unsupported("script injection"))
    }
}
