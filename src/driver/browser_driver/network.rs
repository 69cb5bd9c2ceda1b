//! Network bookkeeping for the browser driver
//!
//! DevTools reports requests and responses as separate events. The log
//! stitches them back into [`HttpRequest`] values with their redirect hops so
//! a navigation can be answered with the same shape the static driver uses.

use crate::driver::types::{HeaderMap, HttpRequest, HttpResponse, ResourceType, ResponseHead};
use chromiumoxide::cdp::browser_protocol::network;
use serde_json::Value;
use std::collections::HashMap;

/// Flattens DevTools headers into a header map
pub fn headers_from(headers: &network::Headers) -> HeaderMap {
    match headers.inner() {
        Value::Object(entries) => entries
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (name.to_ascii_lowercase(), value)
            })
            .collect(),
        _ => HeaderMap::new(),
    }
}

pub fn resource_type_from(kind: &network::ResourceType) -> ResourceType {
    use network::ResourceType as Cdp;

    match kind {
        Cdp::Document => ResourceType::Document,
        Cdp::Stylesheet => ResourceType::Stylesheet,
        Cdp::Image => ResourceType::Image,
        Cdp::Media => ResourceType::Media,
        Cdp::Font => ResourceType::Font,
        Cdp::Script => ResourceType::Script,
        Cdp::TextTrack => ResourceType::TextTrack,
        Cdp::Xhr => ResourceType::Xhr,
        Cdp::Fetch => ResourceType::Fetch,
        Cdp::EventSource => ResourceType::EventSource,
        Cdp::WebSocket => ResourceType::WebSocket,
        Cdp::Manifest => ResourceType::Manifest,
        _ => ResourceType::Other,
    }
}

pub fn head_from(response: &network::Response) -> ResponseHead {
    ResponseHead {
        url: response.url.clone(),
        status: u16::try_from(response.status).unwrap_or(0),
        headers: headers_from(&response.headers),
    }
}

pub fn request_from(id: &str, request: &network::Request, kind: ResourceType) -> HttpRequest {
    HttpRequest {
        id: id.to_string(),
        url: request.url.clone(),
        method: request.method.clone(),
        resource_type: kind,
        headers: headers_from(&request.headers),
        redirect_chain: Vec::new(),
        response: None,
    }
}

/// One document request and the hops that led to it
#[derive(Debug, Clone)]
struct Tracked {
    current: HttpRequest,
    hops: Vec<HttpRequest>,
}

/// Document requests seen by the page, keyed by network request id
#[derive(Debug, Default)]
pub struct NetworkLog {
    main_frame: Option<String>,
    documents: HashMap<String, Tracked>,
    navigation: Option<String>,
}

impl NetworkLog {
    pub fn set_main_frame(&mut self, frame: impl Into<String>) {
        self.main_frame = Some(frame.into());
    }

    pub fn main_frame(&self) -> Option<&str> {
        self.main_frame.as_deref()
    }

    /// Forgets earlier documents ahead of a new navigation
    pub fn begin_navigation(&mut self) {
        self.documents.clear();
        self.navigation = None;
    }

    /// Records a document request, closing the previous hop on a redirect
    pub fn request_sent(
        &mut self,
        request: HttpRequest,
        redirect: Option<ResponseHead>,
        frame: Option<&str>,
    ) {
        if !request.resource_type.is_document() {
            return;
        }

        let id = request.id.clone();
        match (redirect, self.documents.get_mut(&id)) {
            (Some(head), Some(tracked)) => {
                let mut hop = std::mem::replace(&mut tracked.current, request);
                hop.response = Some(head);
                tracked.hops.push(hop);
            }
            _ => {
                self.documents.insert(
                    id.clone(),
                    Tracked {
                        current: request,
                        hops: Vec::new(),
                    },
                );
            }
        }

        if frame.is_some() && frame == self.main_frame.as_deref() {
            self.navigation = Some(id);
        }
    }

    pub fn response_received(&mut self, id: &str, head: ResponseHead) {
        if let Some(tracked) = self.documents.get_mut(id) {
            tracked.current.response = Some(head);
        }
    }

    /// Hops that redirected to the given request, oldest first
    pub fn redirect_chain(&self, id: &str) -> Vec<HttpRequest> {
        self.documents
            .get(id)
            .map(|tracked| tracked.hops.clone())
            .unwrap_or_default()
    }

    /// Final response of the latest top-level navigation, once it arrived
    pub fn navigation_response(&self) -> Option<HttpResponse> {
        let tracked = self.documents.get(self.navigation.as_deref()?)?;
        let head = tracked.current.response.clone()?;
        let mut request = tracked.current.clone();
        request.redirect_chain = tracked.hops.clone();

        Some(HttpResponse { head, request })
    }
}
