//! Scriptable in-memory page driver
//!
//! Serves a fixed navigation response and frame tree, records every
//! capability call, and lets tests fire intercepted requests and dialogs
//! through whatever the crawler registered.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_page::config::{
    Credentials, DeviceProfile, NavigationOptions, ScreenshotOptions, WaitOptions,
};
use sumi_page::driver::{
    resolve_dialog, Dialog, DialogAction, FrameDocument, FrameElement, FrameId, HeaderMap,
    HttpRequest, HttpResponse, PageDriver, PageObserver, RequestDecision, RequestHandler,
    ResponseHead, ScriptTag,
};
use sumi_page::{DriverError, DriverResult};

#[derive(Default)]
struct State {
    calls: Vec<String>,
    handler: Option<Arc<dyn RequestHandler>>,
    observers: Vec<Arc<dyn PageObserver>>,
    interception: bool,
}

/// Page driver backed by canned data
pub struct FakeDriver {
    status: u16,
    headers: HeaderMap,
    redirects: Vec<HttpRequest>,
    frames: HashMap<String, FrameDocument>,
    blocked_frames: HashSet<String>,
    text: String,
    evaluation: Value,
    screenshot: Vec<u8>,
    failing: HashSet<&'static str>,
    state: Mutex<State>,
}

impl FakeDriver {
    /// A page answering `status` with no links, frames or body
    pub fn new(status: u16) -> Self {
        let mut frames = HashMap::new();
        frames.insert("main".to_string(), FrameDocument::default());
        Self {
            status,
            headers: HeaderMap::new(),
            redirects: Vec::new(),
            frames,
            blocked_frames: HashSet::new(),
            text: String::new(),
            evaluation: Value::Null,
            screenshot: Vec::new(),
            failing: HashSet::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Anchors of the top document
    pub fn links(self, hrefs: &[&str]) -> Self {
        self.frame("main", hrefs, &[])
    }

    /// Adds a frame document; children are `(src, frame id)` pairs
    pub fn frame(mut self, id: &str, hrefs: &[&str], children: &[(&str, &str)]) -> Self {
        self.frames.insert(
            id.to_string(),
            FrameDocument {
                url: id.to_string(),
                hrefs: hrefs.iter().map(|h| h.to_string()).collect(),
                frames: children
                    .iter()
                    .map(|(src, frame)| FrameElement {
                        src: Some(src.to_string()),
                        frame: Some(FrameId::new(*frame)),
                    })
                    .collect(),
            },
        );
        self
    }

    /// Makes a frame cross-origin
    pub fn block_frame(mut self, id: &str) -> Self {
        self.blocked_frames.insert(id.to_string());
        self
    }

    /// Prepends a redirect hop to the navigation request's history
    pub fn redirect_from(mut self, url: &str, status: u16, location: &str) -> Self {
        let mut hop = HttpRequest::document(format!("r{}", self.redirects.len()), url);
        let mut headers = HeaderMap::new();
        headers.insert("location".to_string(), location.to_string());
        hop.response = Some(ResponseHead {
            url: url.to_string(),
            status,
            headers,
        });
        self.redirects.push(hop);
        self
    }

    /// Adds a redirect hop whose response was never recorded
    pub fn redirect_without_response(mut self, url: &str) -> Self {
        let hop = HttpRequest::document(format!("r{}", self.redirects.len()), url);
        self.redirects.push(hop);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn evaluation(mut self, value: Value) -> Self {
        self.evaluation = value;
        self
    }

    pub fn screenshot_bytes(mut self, bytes: &[u8]) -> Self {
        self.screenshot = bytes.to_vec();
        self
    }

    /// Makes the named capability fail
    pub fn fail(mut self, capability: &'static str) -> Self {
        self.failing.insert(capability);
        self
    }

    /// Names of the capabilities called so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn called(&self, capability: &str) -> bool {
        self.calls().iter().any(|call| call == capability)
    }

    pub fn interception_enabled(&self) -> bool {
        self.state.lock().unwrap().interception
    }

    /// Offers a request to the registered handler, as a browser would
    pub fn intercept(&self, request: &HttpRequest) -> Option<RequestDecision> {
        let handler = self.state.lock().unwrap().handler.clone();
        handler.map(|handler| handler.handle(request))
    }

    /// Opens a dialog and returns how the observers closed it
    pub fn open_dialog(&self, dialog: &Dialog) -> DialogAction {
        let observers = self.state.lock().unwrap().observers.clone();
        resolve_dialog(&observers, dialog)
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().unwrap().observers.len()
    }

    fn call(&self, capability: &'static str) -> DriverResult<()> {
        self.state.lock().unwrap().calls.push(capability.to_string());
        if self.failing.contains(capability) {
            return Err(DriverError::Protocol(format!("{} failed", capability)));
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, url: &str, _options: &NavigationOptions) -> DriverResult<HttpResponse> {
        self.call("navigate")?;
        if self.failing.contains("navigate-timeout") {
            return Err(DriverError::Timeout(Duration::from_millis(30_000)));
        }

        let mut request = HttpRequest::document("nav", url);
        request.redirect_chain = self.redirects.clone();

        if self.interception_enabled() {
            if let Some(RequestDecision::Abort(reason)) = self.intercept(&request) {
                return Err(DriverError::Aborted {
                    url: url.to_string(),
                    reason,
                });
            }
        }

        Ok(HttpResponse {
            head: ResponseHead {
                url: url.to_string(),
                status: self.status,
                headers: self.headers.clone(),
            },
            request,
        })
    }

    async fn response_text(&self, _response: &HttpResponse) -> DriverResult<String> {
        self.call("text")?;
        Ok(self.text.clone())
    }

    async fn main_frame(&self) -> DriverResult<FrameId> {
        self.call("main_frame")?;
        Ok(FrameId::new("main"))
    }

    async fn frame_document(&self, frame: &FrameId) -> DriverResult<FrameDocument> {
        if self.blocked_frames.contains(frame.as_str()) {
            return Err(DriverError::FrameAccess {
                frame: frame.to_string(),
            });
        }
        self.frames
            .get(frame.as_str())
            .cloned()
            .ok_or_else(|| DriverError::Protocol(format!("unknown frame {}", frame)))
    }

    fn set_request_handler(&self, handler: Arc<dyn RequestHandler>) {
        self.state.lock().unwrap().handler = Some(handler);
    }

    fn add_observer(&self, observer: Arc<dyn PageObserver>) {
        self.state.lock().unwrap().observers.push(observer);
    }

    async fn evaluate(&self, _function: &str, _args: &[Value]) -> DriverResult<Value> {
        self.call("evaluate")?;
        Ok(self.evaluation.clone())
    }

    async fn evaluate_on_new_document(&self, _source: &str) -> DriverResult<()> {
        self.call("init_script")
    }

    async fn authenticate(&self, _credentials: &Credentials) -> DriverResult<()> {
        self.call("authenticate")
    }

    async fn emulate(&self, _device: &DeviceProfile) -> DriverResult<()> {
        self.call("emulate")
    }

    async fn set_cache_enabled(&self, _enabled: bool) -> DriverResult<()> {
        self.call("cache")
    }

    async fn set_user_agent(&self, _user_agent: &str) -> DriverResult<()> {
        self.call("user_agent")
    }

    async fn set_extra_headers(&self, _headers: &HeaderMap) -> DriverResult<()> {
        self.call("extra_headers")
    }

    async fn set_javascript_enabled(&self, _enabled: bool) -> DriverResult<()> {
        self.call("javascript")
    }

    async fn set_request_interception(&self, enabled: bool) -> DriverResult<()> {
        self.call("interception")?;
        self.state.lock().unwrap().interception = enabled;
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str, options: &WaitOptions) -> DriverResult<()> {
        self.call("wait_selector")?;
        if self.failing.contains("wait_selector_timeout") {
            return Err(DriverError::Timeout(Duration::from_millis(options.timeout_ms)));
        }
        Ok(())
    }

    async fn wait_for_function(
        &self,
        _function: &str,
        _options: &WaitOptions,
        _args: &[Value],
    ) -> DriverResult<()> {
        self.call("wait_function")
    }

    async fn screenshot(&self, _options: &ScreenshotOptions) -> DriverResult<Vec<u8>> {
        self.call("screenshot")?;
        Ok(self.screenshot.clone())
    }

    async fn add_script_tag(&self, _tag: &ScriptTag) -> DriverResult<()> {
        self.call("script_tag")
    }
}
