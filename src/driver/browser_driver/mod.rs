//! Chromium page driver
//!
//! Drives one tab of a headless Chromium over the DevTools protocol with
//! `chromiumoxide`. Unlike the static driver it runs the page's scripts, so
//! page evaluation, function waits, screenshots, script injection and the
//! console/error/dialog observers all work.
//!
//! Request interception goes through the DevTools `Fetch` domain: every
//! paused request is offered to the registered handler and answered with its
//! decision. Credentials are sent preemptively as a Basic `Authorization`
//! header.
//!
//! Only available with the `browser` feature.

mod listeners;
mod network;
mod scripts;

use crate::config::{
    Credentials, DeviceProfile, ImageFormat, NavigationOptions, ScreenshotOptions, WaitOptions,
};
use crate::driver::events::PageObserver;
use crate::driver::frames::{FrameDocument, FrameElement, FrameId};
use crate::driver::intercept::{RequestDecision, RequestHandler};
use crate::driver::types::{HeaderMap, HttpRequest, HttpResponse, ScriptTag};
use crate::driver::PageDriver;
use crate::{DriverError, DriverResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
    CreateIsolatedWorldParams, FrameTree, GetFrameTreeParams, GetLayoutMetricsParams, Viewport,
};
use chromiumoxide::cdp::browser_protocol::{dom, emulation, fetch, network as cdp_network, page};
use chromiumoxide::cdp::js_protocol::runtime;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use network::NetworkLog;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long navigation waits for trailing network events after the load
const NETWORK_SETTLE: Duration = Duration::from_millis(500);

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        DriverError::Protocol(e.to_string())
    }
}

/// How to start the browser
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Chrome/Chromium binary; looked up on the system when absent
    pub executable: Option<PathBuf>,
    /// Extra command-line switches
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: Vec::new(),
        }
    }
}

/// Header and identity overrides applied to the page
#[derive(Debug, Default)]
struct Overrides {
    user_agent: Option<String>,
    device_user_agent: Option<String>,
    extra_headers: HeaderMap,
    credentials: Option<Credentials>,
}

impl Overrides {
    fn effective_user_agent(&self) -> Option<&str> {
        self.user_agent
            .as_deref()
            .or(self.device_user_agent.as_deref())
    }

    fn effective_headers(&self) -> HeaderMap {
        let mut headers = self.extra_headers.clone();
        if let Some(credentials) = &self.credentials {
            let token = BASE64.encode(format!("{}:{}", credentials.username, credentials.password));
            headers.insert("authorization".to_string(), format!("Basic {}", token));
        }
        headers
    }
}

/// State shared between the driver and its event loops
struct Shared {
    handler: RwLock<Option<Arc<dyn RequestHandler>>>,
    observers: RwLock<Vec<Arc<dyn PageObserver>>>,
    network: Mutex<NetworkLog>,
    overrides: Mutex<Overrides>,
}

impl Shared {
    fn new() -> Self {
        Self {
            handler: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
            network: Mutex::new(NetworkLog::default()),
            overrides: Mutex::new(Overrides::default()),
        }
    }

    fn network(&self) -> MutexGuard<'_, NetworkLog> {
        self.network.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn overrides(&self) -> MutexGuard<'_, Overrides> {
        self.overrides.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> Vec<Arc<dyn PageObserver>> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn decide(&self, request: &HttpRequest) -> RequestDecision {
        let handler = self
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler.handle(request),
            None => RequestDecision::continue_unmodified(),
        }
    }
}

/// Document snapshot returned by the page-side link script
#[derive(Debug, Deserialize)]
struct Snapshot {
    url: String,
    hrefs: Vec<String>,
    frames: Vec<Option<String>>,
}

/// One Chromium tab behind the page driver interface
pub struct BrowserDriver {
    page: Page,
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
    // Closing the browser ends the tab
    _browser: Browser,
}

impl BrowserDriver {
    /// Launches a browser and opens a blank tab
    pub async fn launch(options: &BrowserOptions) -> DriverResult<Self> {
        tracing::info!("Launching browser (headless={})", options.headless);

        let mut builder = BrowserConfig::builder();
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");
        for arg in &options.args {
            builder = builder.arg(arg);
        }
        let config = builder
            .build()
            .map_err(|e| DriverError::Protocol(format!("Invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.execute(cdp_network::EnableParams::default()).await?;
        page.execute(runtime::EnableParams::default()).await?;

        let shared = Arc::new(Shared::new());
        if let Some(frame) = page.mainframe().await? {
            shared.network().set_main_frame(frame.inner().clone());
        }

        let mut tasks = listeners::spawn_listeners(&page, &shared).await?;
        tasks.push(events);

        Ok(Self {
            page,
            shared,
            tasks,
            _browser: browser,
        })
    }

    /// Evaluates an expression, in a specific execution context if given
    async fn eval(
        &self,
        expression: String,
        context: Option<runtime::ExecutionContextId>,
    ) -> DriverResult<Value> {
        let mut params = runtime::EvaluateParams::new(expression);
        params.await_promise = Some(true);
        params.return_by_value = Some(true);
        params.context_id = context;

        let returns = self.page.execute(params).await?.result;
        if let Some(details) = returns.exception_details {
            let message = details
                .exception
                .and_then(|exception| exception.description)
                .unwrap_or(details.text);
            return Err(DriverError::Protocol(format!("Evaluation failed: {}", message)));
        }

        Ok(returns.result.value.unwrap_or(Value::Null))
    }

    /// Re-evaluates a boolean expression until it holds
    async fn poll(&self, expression: &str, interval: Duration) -> DriverResult<()> {
        loop {
            if self.eval(expression.to_string(), None).await? == Value::Bool(true) {
                return Ok(());
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn wait_until_true(&self, expression: String, options: &WaitOptions) -> DriverResult<()> {
        let interval = Duration::from_millis(options.polling_ms.unwrap_or(scripts::ANIMATION_FRAME_MS));

        // A timeout of zero waits indefinitely
        if options.timeout_ms == 0 {
            return self.poll(&expression, interval).await;
        }
        let limit = Duration::from_millis(options.timeout_ms);
        tokio::time::timeout(limit, self.poll(&expression, interval))
            .await
            .map_err(|_| DriverError::Timeout(limit))?
    }

    async fn apply_user_agent(&self) -> DriverResult<()> {
        let agent = self.shared.overrides().effective_user_agent().map(str::to_string);
        if let Some(agent) = agent {
            self.page
                .execute(cdp_network::SetUserAgentOverrideParams::new(agent))
                .await?;
        }
        Ok(())
    }

    async fn apply_headers(&self) -> DriverResult<()> {
        let headers = self.shared.overrides().effective_headers();
        let headers: serde_json::Map<String, Value> = headers
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        self.page
            .execute(cdp_network::SetExtraHttpHeadersParams::new(
                cdp_network::Headers::new(Value::Object(headers)),
            ))
            .await?;
        Ok(())
    }

    async fn frame_tree(&self) -> DriverResult<FrameTree> {
        Ok(self.page.execute(GetFrameTreeParams::default()).await?.result.frame_tree)
    }
}

impl Drop for BrowserDriver {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Depth-first search for a frame in the tree
fn find_frame<'t>(tree: &'t FrameTree, id: &str) -> Option<&'t FrameTree> {
    if tree.frame.id.inner() == id {
        return Some(tree);
    }
    tree.child_frames
        .iter()
        .flatten()
        .find_map(|child| find_frame(child, id))
}

/// Pairs frame elements with child frames in document order
fn frame_elements(sources: Vec<Option<String>>, node: &FrameTree) -> Vec<FrameElement> {
    let children: Vec<&FrameTree> = node.child_frames.iter().flatten().collect();
    sources
        .into_iter()
        .enumerate()
        .map(|(index, src)| FrameElement {
            src,
            frame: children
                .get(index)
                .map(|child| FrameId::new(child.frame.id.inner().clone())),
        })
        .collect()
}

#[async_trait]
impl PageDriver for BrowserDriver {
    async fn navigate(
        &self,
        url: &str,
        options: &NavigationOptions,
    ) -> DriverResult<HttpResponse> {
        tracing::debug!(
            "Navigating to {} (wait until {:?}, timeout {}ms)",
            url,
            options.wait_until,
            options.timeout_ms
        );
        self.shared.network().begin_navigation();

        let navigation = self.page.goto(url);
        if options.timeout_ms == 0 {
            navigation.await?;
        } else {
            let limit = Duration::from_millis(options.timeout_ms);
            tokio::time::timeout(limit, navigation)
                .await
                .map_err(|_| DriverError::Timeout(limit))??;
        }

        // Network events are consumed on their own task and can trail the load
        let settle = async {
            loop {
                let response = self.shared.network().navigation_response();
                if let Some(response) = response {
                    return response;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(NETWORK_SETTLE, settle)
            .await
            .map_err(|_| DriverError::Protocol(format!("No response recorded for {}", url)))
    }

    async fn response_text(&self, response: &HttpResponse) -> DriverResult<String> {
        let body = self
            .page
            .execute(cdp_network::GetResponseBodyParams::new(
                cdp_network::RequestId::new(response.request.id.clone()),
            ))
            .await?
            .result;

        if body.base64_encoded {
            let bytes = BASE64
                .decode(body.body.as_bytes())
                .map_err(|e| DriverError::Protocol(format!("Invalid response body: {}", e)))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            Ok(body.body)
        }
    }

    async fn main_frame(&self) -> DriverResult<FrameId> {
        let tree = self.frame_tree().await?;
        Ok(FrameId::new(tree.frame.id.inner().clone()))
    }

    async fn frame_document(&self, frame: &FrameId) -> DriverResult<FrameDocument> {
        let tree = self.frame_tree().await?;
        let node = find_frame(&tree, frame.as_str()).ok_or_else(|| {
            DriverError::Protocol(format!("Frame {} is no longer attached", frame))
        })?;

        if node.frame.security_origin != tree.frame.security_origin {
            return Err(DriverError::FrameAccess {
                frame: frame.to_string(),
            });
        }

        let mut world = CreateIsolatedWorldParams::new(page::FrameId::new(frame.as_str()));
        world.world_name = Some(scripts::SNAPSHOT_WORLD.to_string());
        let context = self.page.execute(world).await?.result.execution_context_id;

        let value = self
            .eval(scripts::FRAME_SNAPSHOT_SCRIPT.to_string(), Some(context))
            .await?;
        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| DriverError::Protocol(format!("Malformed frame snapshot: {}", e)))?;

        Ok(FrameDocument {
            url: snapshot.url,
            hrefs: snapshot.hrefs,
            frames: frame_elements(snapshot.frames, node),
        })
    }

    fn set_request_handler(&self, handler: Arc<dyn RequestHandler>) {
        *self
            .shared
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn add_observer(&self, observer: Arc<dyn PageObserver>) {
        self.shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    async fn evaluate(&self, function: &str, args: &[Value]) -> DriverResult<Value> {
        self.eval(scripts::call_expression(function, args), None).await
    }

    async fn evaluate_on_new_document(&self, source: &str) -> DriverResult<()> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(source))
            .await?;
        Ok(())
    }

    async fn authenticate(&self, credentials: &Credentials) -> DriverResult<()> {
        self.shared.overrides().credentials = Some(credentials.clone());
        self.apply_headers().await
    }

    async fn emulate(&self, device: &DeviceProfile) -> DriverResult<()> {
        tracing::debug!("Emulating {}", device.name);
        let viewport = &device.viewport;
        let metrics = emulation::SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.is_mobile)
            .build()
            .map_err(DriverError::Protocol)?;
        self.page.execute(metrics).await?;
        self.page
            .execute(emulation::SetTouchEmulationEnabledParams::new(viewport.has_touch))
            .await?;

        self.shared.overrides().device_user_agent = Some(device.user_agent.clone());
        self.apply_user_agent().await
    }

    async fn set_cache_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.page
            .execute(cdp_network::SetCacheDisabledParams::new(!enabled))
            .await?;
        Ok(())
    }

    async fn set_user_agent(&self, user_agent: &str) -> DriverResult<()> {
        self.shared.overrides().user_agent = Some(user_agent.to_string());
        self.apply_user_agent().await
    }

    async fn set_extra_headers(&self, headers: &HeaderMap) -> DriverResult<()> {
        self.shared.overrides().extra_headers = headers.clone();
        self.apply_headers().await
    }

    async fn set_javascript_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.page
            .execute(emulation::SetScriptExecutionDisabledParams::new(!enabled))
            .await?;
        Ok(())
    }

    async fn set_request_interception(&self, enabled: bool) -> DriverResult<()> {
        if enabled {
            self.page.execute(fetch::EnableParams::default()).await?;
        } else {
            self.page.execute(fetch::DisableParams::default()).await?;
        }
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, options: &WaitOptions) -> DriverResult<()> {
        let expression = scripts::selector_expression(selector, options.visible, options.hidden);
        self.wait_until_true(expression, options).await
    }

    async fn wait_for_function(
        &self,
        function: &str,
        options: &WaitOptions,
        args: &[Value],
    ) -> DriverResult<()> {
        self.wait_until_true(scripts::predicate_expression(function, args), options)
            .await
    }

    async fn screenshot(&self, options: &ScreenshotOptions) -> DriverResult<Vec<u8>> {
        let format = match options.format {
            ImageFormat::Png => CaptureScreenshotFormat::Png,
            ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
        };
        let mut params = CaptureScreenshotParams::builder().format(format);
        if let (ImageFormat::Jpeg, Some(quality)) = (options.format, options.quality) {
            params = params.quality(i64::from(quality));
        }

        let clip = match (&options.clip, options.full_page) {
            (Some(clip), _) => Some(Viewport {
                x: clip.x,
                y: clip.y,
                width: clip.width,
                height: clip.height,
                scale: 1.0,
            }),
            (None, true) => {
                let metrics = self
                    .page
                    .execute(GetLayoutMetricsParams::default())
                    .await?
                    .result;
                let size = metrics.css_content_size;
                Some(Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: size.width,
                    height: size.height,
                    scale: 1.0,
                })
            }
            (None, false) => None,
        };
        if let Some(clip) = clip {
            params = params.clip(clip).capture_beyond_viewport(true);
        }

        if options.omit_background {
            self.page
                .execute(emulation::SetDefaultBackgroundColorOverrideParams {
                    color: Some(dom::Rgba {
                        r: 0,
                        g: 0,
                        b: 0,
                        a: Some(0.0),
                    }),
                })
                .await?;
        }
        let captured = self.page.execute(params.build()).await;
        if options.omit_background {
            self.page
                .execute(emulation::SetDefaultBackgroundColorOverrideParams { color: None })
                .await?;
        }

        let captured = captured?.result;
        let data: &str = captured.data.as_ref();
        BASE64
            .decode(data.as_bytes())
            .map_err(|e| DriverError::Protocol(format!("Invalid screenshot data: {}", e)))
    }

    async fn add_script_tag(&self, tag: &ScriptTag) -> DriverResult<()> {
        let expression = match tag {
            ScriptTag::Url(url) => scripts::script_tag_expression(Some(url), None),
            ScriptTag::Content(content) => scripts::script_tag_expression(None, Some(content)),
        };
        self.eval(expression, None).await?;
        Ok(())
    }
}
