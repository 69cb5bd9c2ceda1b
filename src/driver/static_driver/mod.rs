//! Static page driver
//!
//! A page driver that loads documents over plain HTTP and inspects them
//! without running any JavaScript. It covers everything a crawl needs when
//! the page does not have to be rendered: request interception (every
//! document hop, redirect hops and frame documents included), manual
//! redirect walking, HTTP Basic authentication, user agent and header
//! overrides, cache bypass, frame trees with same-origin checks, and selector
//! wait gates checked against the fetched markup.
//!
//! Nested frame documents load under the same deadline as the navigation that
//! revealed them.
//!
//! Script evaluation, function waits, screenshots, script injection and
//! visibility waits need a real browser and fail with
//! `DriverError::Unsupported`. Init scripts and the JavaScript toggle are
//! accepted and recorded; without a script engine they have nothing to act on.

mod document;
mod fetch;

pub use fetch::{build_http_client, DEFAULT_USER_AGENT};

use crate::config::{Credentials, DeviceProfile, NavigationOptions, WaitOptions};
use crate::driver::events::PageObserver;
use crate::driver::frames::{FrameDocument, FrameId};
use crate::driver::intercept::{RequestDecision, RequestHandler};
use crate::driver::types::{HeaderMap, HttpRequest, HttpResponse, ResourceType, ResponseHead};
use crate::driver::PageDriver;
use crate::url::same_origin;
use crate::{DriverError, DriverResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fetch::{redirect_target, send, wants_basic_auth, Hop, MAX_REDIRECTS};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

const MAIN_FRAME: &str = "main";

/// A fetched document
#[derive(Debug, Clone)]
struct LoadedDocument {
    url: Url,
    body: String,
}

/// Mutable page settings and loaded content
struct Session {
    user_agent: Option<String>,
    device: Option<DeviceProfile>,
    extra_headers: HeaderMap,
    credentials: Option<Credentials>,
    cache_enabled: bool,
    javascript_enabled: bool,
    interception: bool,
    init_scripts: Vec<String>,
    frame_deadline: Option<Duration>,
    main: Option<LoadedDocument>,
    frames: HashMap<FrameId, LoadedDocument>,
    bodies: HashMap<String, String>,
    next_request_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user_agent: None,
            device: None,
            extra_headers: HeaderMap::new(),
            credentials: None,
            cache_enabled: true,
            javascript_enabled: true,
            interception: false,
            init_scripts: Vec::new(),
            frame_deadline: None,
            main: None,
            frames: HashMap::new(),
            bodies: HashMap::new(),
            next_request_id: 1,
        }
    }
}

/// JavaScript-less page driver over HTTP
pub struct StaticDriver {
    client: Client,
    session: Mutex<Session>,
    handler: RwLock<Option<Arc<dyn RequestHandler>>>,
    observers: RwLock<Vec<Arc<dyn PageObserver>>>,
}

impl StaticDriver {
    /// Creates a driver with the default HTTP client
    pub fn new() -> DriverResult<Self> {
        Ok(Self::with_client(build_http_client()?))
    }

    /// Creates a driver around an existing client
    ///
    /// The client should not follow redirects on its own, otherwise redirect
    /// hops can neither be intercepted nor recorded.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            session: Mutex::new(Session::default()),
            handler: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Scripts registered through `evaluate_on_new_document`
    pub fn init_scripts(&self) -> Vec<String> {
        self.session().init_scripts.clone()
    }

    /// Whether request interception is currently enabled
    pub fn interception_enabled(&self) -> bool {
        self.session().interception
    }

    /// Number of registered page observers
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_request_id(&self) -> String {
        let mut session = self.session();
        let id = session.next_request_id;
        session.next_request_id += 1;
        id.to_string()
    }

    /// Headers the page would send with a document request right now
    fn request_headers(&self) -> HeaderMap {
        let session = self.session();
        let mut headers = HeaderMap::new();

        let user_agent = session
            .user_agent
            .clone()
            .or_else(|| session.device.as_ref().map(|d| d.user_agent.clone()))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        headers.insert("user-agent".to_string(), user_agent);

        if !session.cache_enabled {
            headers.insert("cache-control".to_string(), "no-cache".to_string());
            headers.insert("pragma".to_string(), "no-cache".to_string());
        }

        for (name, value) in &session.extra_headers {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        headers
    }

    /// Intercept decision for a request, or "continue" when interception is off
    fn decide(&self, request: &HttpRequest) -> RequestDecision {
        if !self.session().interception {
            return RequestDecision::continue_unmodified();
        }

        let handler = self
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => handler.handle(request),
            None => {
                tracing::warn!(
                    "Request interception enabled without a handler, continuing {}",
                    request.url
                );
                RequestDecision::continue_unmodified()
            }
        }
    }

    /// Runs one document hop: interception, then the network if allowed
    async fn dispatch(&self, request: &mut HttpRequest) -> DriverResult<Hop> {
        match self.decide(request) {
            RequestDecision::Abort(reason) => Err(DriverError::Aborted {
                url: request.url.clone(),
                reason,
            }),
            RequestDecision::Respond(answer) => {
                let mut headers = answer.headers;
                if let Some(content_type) = answer.content_type {
                    headers.insert("content-type".to_string(), content_type);
                }
                Ok(Hop {
                    head: ResponseHead {
                        url: request.url.clone(),
                        status: answer.status,
                        headers,
                    },
                    body: answer.body,
                })
            }
            RequestDecision::Continue(overrides) => {
                if let Some(url) = overrides.url {
                    request.url = url;
                }
                if let Some(method) = overrides.method {
                    request.method = method;
                }
                if let Some(headers) = overrides.headers {
                    request.headers = headers;
                }

                let url = Url::parse(&request.url)?;
                let hop = send(&self.client, &request.method, &url, &request.headers).await?;

                let credentials = self.session().credentials.clone();
                match credentials {
                    Some(credentials)
                        if wants_basic_auth(&hop.head)
                            && !request.headers.contains_key("authorization") =>
                    {
                        let token = BASE64
                            .encode(format!("{}:{}", credentials.username, credentials.password));
                        request
                            .headers
                            .insert("authorization".to_string(), format!("Basic {}", token));
                        send(&self.client, &request.method, &url, &request.headers).await
                    }
                    _ => Ok(hop),
                }
            }
        }
    }

    /// Loads a document, walking redirects hop by hop
    async fn load(&self, target: Url) -> DriverResult<(HttpResponse, String)> {
        let mut chain: Vec<HttpRequest> = Vec::new();
        let mut next = target.clone();

        loop {
            let mut request = HttpRequest {
                id: self.next_request_id(),
                url: next.to_string(),
                method: "GET".to_string(),
                resource_type: ResourceType::Document,
                headers: self.request_headers(),
                redirect_chain: chain.clone(),
                response: None,
            };

            let hop = self.dispatch(&mut request).await?;
            let request_url = Url::parse(&request.url)?;

            match redirect_target(&hop.head, &request_url) {
                Some(location) => {
                    if chain.len() >= MAX_REDIRECTS {
                        return Err(DriverError::TooManyRedirects {
                            url: target.to_string(),
                        });
                    }
                    tracing::debug!(
                        "{} redirected ({}) to {}",
                        request.url,
                        hop.head.status,
                        location
                    );
                    request.redirect_chain = Vec::new();
                    request.response = Some(hop.head);
                    chain.push(request);
                    next = location;
                }
                None => {
                    request.response = Some(hop.head.clone());
                    self.session()
                        .bodies
                        .insert(request.id.clone(), hop.body.clone());
                    let response = HttpResponse {
                        head: hop.head,
                        request,
                    };
                    return Ok((response, hop.body));
                }
            }
        }
    }

    fn main_document(&self) -> DriverResult<LoadedDocument> {
        self.session()
            .main
            .clone()
            .ok_or_else(|| DriverError::Protocol("No document loaded".to_string()))
    }

    /// Fetches (or reuses) a nested frame's document
    async fn child_document(&self, frame: &FrameId) -> DriverResult<LoadedDocument> {
        let top = self.main_document()?;
        let frame_url = Url::parse(frame.as_str())?;

        if !same_origin(&frame_url, &top.url) {
            return Err(DriverError::FrameAccess {
                frame: frame.to_string(),
            });
        }

        let cached = self.session().frames.get(frame).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let deadline = self.session().frame_deadline;
        let (response, body) = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.load(frame_url))
                .await
                .map_err(|_| {
                    tracing::warn!("Frame {} did not load within {:?}", frame, limit);
                    DriverError::Timeout(limit)
                })??,
            None => self.load(frame_url).await?,
        };
        let final_url = Url::parse(response.url()).unwrap_or_else(|_| top.url.clone());

        // The frame may have been redirected off-origin
        if !same_origin(&final_url, &top.url) {
            return Err(DriverError::FrameAccess {
                frame: frame.to_string(),
            });
        }

        let loaded = LoadedDocument {
            url: final_url,
            body,
        };
        self.session().frames.insert(frame.clone(), loaded.clone());
        Ok(loaded)
    }
}

#[async_trait]
impl PageDriver for StaticDriver {
    async fn navigate(
        &self,
        url: &str,
        options: &NavigationOptions,
    ) -> DriverResult<HttpResponse> {
        let target = Url::parse(url)?;
        let javascript = self.session().javascript_enabled;
        tracing::debug!(
            "Loading {} (wait until {:?}, timeout {}ms, javascript {})",
            target,
            options.wait_until,
            options.timeout_ms,
            if javascript { "ignored" } else { "off" }
        );

        // A timeout of zero disables the navigation deadline
        let deadline = (options.timeout_ms > 0).then(|| Duration::from_millis(options.timeout_ms));
        let (response, body) = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.load(target))
                .await
                .map_err(|_| DriverError::Timeout(limit))??,
            None => self.load(target).await?,
        };

        let loaded = LoadedDocument {
            url: Url::parse(response.url())?,
            body,
        };
        {
            let mut session = self.session();
            session.main = Some(loaded);
            session.frames.clear();
            session.frame_deadline = deadline;
        }

        Ok(response)
    }

    async fn response_text(&self, response: &HttpResponse) -> DriverResult<String> {
        self.session()
            .bodies
            .get(&response.request.id)
            .cloned()
            .ok_or_else(|| {
                DriverError::Protocol(format!(
                    "No body recorded for request {} ({})",
                    response.request.id, response.request.url
                ))
            })
    }

    async fn main_frame(&self) -> DriverResult<FrameId> {
        self.main_document()?;
        Ok(FrameId::new(MAIN_FRAME))
    }

    async fn frame_document(&self, frame: &FrameId) -> DriverResult<FrameDocument> {
        let loaded = if frame.as_str() == MAIN_FRAME {
            self.main_document()?
        } else {
            self.child_document(frame).await?
        };

        Ok(document::parse_frame_document(&loaded.body, &loaded.url))
    }

    fn set_request_handler(&self, handler: Arc<dyn RequestHandler>) {
        *self.handler.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn add_observer(&self, observer: Arc<dyn PageObserver>) {
        // No scripts run, so console, error and dialog events never fire
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    async fn evaluate_on_new_document(&self, source: &str) -> DriverResult<()> {
        self.session().init_scripts.push(source.to_string());
        Ok(())
    }

    async fn authenticate(&self, credentials: &Credentials) -> DriverResult<()> {
        self.session().credentials = Some(credentials.clone());
        Ok(())
    }

    async fn emulate(&self, device: &DeviceProfile) -> DriverResult<()> {
        tracing::debug!("Emulating {}", device.name);
        self.session().device = Some(device.clone());
        Ok(())
    }

    async fn set_cache_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.session().cache_enabled = enabled;
        Ok(())
    }

    async fn set_user_agent(&self, user_agent: &str) -> DriverResult<()> {
        self.session().user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_extra_headers(&self, headers: &HeaderMap) -> DriverResult<()> {
        self.session().extra_headers = headers.clone();
        Ok(())
    }

    async fn set_javascript_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.session().javascript_enabled = enabled;
        Ok(())
    }

    async fn set_request_interception(&self, enabled: bool) -> DriverResult<()> {
        self.session().interception = enabled;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, options: &WaitOptions) -> DriverResult<()> {
        // Markup alone says nothing about layout
        if options.visible {
            return Err(DriverError::Unsupported("visibility waits"));
        }

        let loaded = self.main_document()?;
        let present = document::matches_selector(&loaded.body, selector)?;
        let satisfied = if options.hidden { !present } else { present };

        if satisfied {
            return Ok(());
        }

        // Static markup never changes, so an unmet condition can only time out
        let limit = Duration::from_millis(options.timeout_ms);
        tokio::time::sleep(limit).await;
        Err(DriverError::Timeout(limit))
    }
}
