//! DevTools event loops
//!
//! Each subscription runs on its own task for as long as the page lives.
//! Intercepted requests and dialogs are answered from here; console output,
//! page errors and network events are handed to the shared page state.

use super::network::{head_from, request_from, resource_type_from};
use super::Shared;
use crate::driver::events::{
    resolve_dialog, ConsoleLevel, ConsoleMessage, Dialog, DialogAction, DialogKind,
};
use crate::driver::intercept::RequestDecision;
use crate::driver::types::{HeaderMap, ResourceType};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::{fetch, network, page};
use chromiumoxide::cdp::js_protocol::runtime;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Subscribes to every event the driver reacts to
///
/// Subscriptions are registered before this returns, so no event emitted
/// afterwards is missed.
pub(super) async fn spawn_listeners(
    page: &Page,
    shared: &Arc<Shared>,
) -> Result<Vec<JoinHandle<()>>, CdpError> {
    let mut paused = page.event_listener::<fetch::EventRequestPaused>().await?;
    let mut sent = page
        .event_listener::<network::EventRequestWillBeSent>()
        .await?;
    let mut received = page
        .event_listener::<network::EventResponseReceived>()
        .await?;
    let mut console = page
        .event_listener::<runtime::EventConsoleApiCalled>()
        .await?;
    let mut thrown = page
        .event_listener::<runtime::EventExceptionThrown>()
        .await?;
    let mut dialogs = page
        .event_listener::<page::EventJavascriptDialogOpening>()
        .await?;

    let mut tasks = Vec::new();

    let (cdp, state) = (page.clone(), shared.clone());
    tasks.push(tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let id = event
                .network_id
                .as_ref()
                .map(|id| id.inner().clone())
                .unwrap_or_else(|| event.request_id.inner().clone());
            let kind = resource_type_from(&event.resource_type);
            let mut request = request_from(&id, &event.request, kind);
            request.redirect_chain = state.network().redirect_chain(&id);

            let decision = state.decide(&request);
            if let Err(e) = answer(&cdp, event.request_id.clone(), decision).await {
                tracing::warn!("Failed to answer intercepted request {}: {}", request.url, e);
            }
        }
    }));

    let state = shared.clone();
    tasks.push(tokio::spawn(async move {
        while let Some(event) = sent.next().await {
            let kind = event
                .r#type
                .as_ref()
                .map(resource_type_from)
                .unwrap_or(ResourceType::Other);
            let request = request_from(event.request_id.inner(), &event.request, kind);
            let redirect = event.redirect_response.as_ref().map(head_from);
            let frame = event.frame_id.as_ref().map(|frame| frame.inner().as_str());
            state.network().request_sent(request, redirect, frame);
        }
    }));

    let state = shared.clone();
    tasks.push(tokio::spawn(async move {
        while let Some(event) = received.next().await {
            state
                .network()
                .response_received(event.request_id.inner(), head_from(&event.response));
        }
    }));

    let state = shared.clone();
    tasks.push(tokio::spawn(async move {
        while let Some(event) = console.next().await {
            let message = ConsoleMessage {
                level: console_level(&event.r#type),
                text: console_text(&event.args),
            };
            for observer in state.observers() {
                observer.on_console(&message);
            }
        }
    }));

    let state = shared.clone();
    tasks.push(tokio::spawn(async move {
        while let Some(event) = thrown.next().await {
            let details = &event.exception_details;
            let error = details
                .exception
                .as_ref()
                .and_then(|exception| exception.description.clone())
                .unwrap_or_else(|| details.text.clone());
            for observer in state.observers() {
                observer.on_page_error(&error);
            }
        }
    }));

    let (cdp, state) = (page.clone(), shared.clone());
    tasks.push(tokio::spawn(async move {
        while let Some(event) = dialogs.next().await {
            let dialog = Dialog {
                kind: dialog_kind(&event.r#type),
                message: event.message.clone(),
                default_value: event.default_prompt.clone(),
            };
            let action = resolve_dialog(&state.observers(), &dialog);

            let mut params = match &action {
                DialogAction::Dismiss => page::HandleJavaScriptDialogParams::new(false),
                DialogAction::Accept(_) => page::HandleJavaScriptDialogParams::new(true),
            };
            if let DialogAction::Accept(text) = action {
                params.prompt_text = text;
            }
            if let Err(e) = cdp.execute(params).await {
                tracing::warn!("Failed to close {:?} dialog: {}", dialog.kind, e);
            }
        }
    }));

    Ok(tasks)
}

/// Sends the handler's decision back to the browser
async fn answer(
    page: &Page,
    id: fetch::RequestId,
    decision: RequestDecision,
) -> Result<(), CdpError> {
    match decision {
        RequestDecision::Continue(overrides) => {
            let mut params = fetch::ContinueRequestParams::new(id);
            params.url = overrides.url;
            params.method = overrides.method;
            params.headers = overrides.headers.map(|headers| header_entries(&headers));
            page.execute(params).await?;
        }
        RequestDecision::Respond(answer) => {
            let mut headers = answer.headers;
            if let Some(content_type) = answer.content_type {
                headers.insert("content-type".to_string(), content_type);
            }
            let mut params = fetch::FulfillRequestParams::new(id, i64::from(answer.status));
            params.response_headers = Some(header_entries(&headers));
            params.body = Some(BASE64.encode(answer.body).into());
            page.execute(params).await?;
        }
        RequestDecision::Abort(reason) => {
            page.execute(fetch::FailRequestParams::new(id, error_reason(&reason)))
                .await?;
        }
    }
    Ok(())
}

fn header_entries(headers: &HeaderMap) -> Vec<fetch::HeaderEntry> {
    headers
        .iter()
        .map(|(name, value)| fetch::HeaderEntry::new(name.clone(), value.clone()))
        .collect()
}

/// Maps an abort reason to a network error code
fn error_reason(reason: &str) -> network::ErrorReason {
    use network::ErrorReason;

    match reason.to_ascii_lowercase().as_str() {
        "aborted" => ErrorReason::Aborted,
        "accessdenied" => ErrorReason::AccessDenied,
        "addressunreachable" => ErrorReason::AddressUnreachable,
        "blockedbyclient" => ErrorReason::BlockedByClient,
        "blockedbyresponse" => ErrorReason::BlockedByResponse,
        "connectionaborted" => ErrorReason::ConnectionAborted,
        "connectionclosed" => ErrorReason::ConnectionClosed,
        "connectionfailed" => ErrorReason::ConnectionFailed,
        "connectionrefused" => ErrorReason::ConnectionRefused,
        "connectionreset" => ErrorReason::ConnectionReset,
        "internetdisconnected" => ErrorReason::InternetDisconnected,
        "namenotresolved" => ErrorReason::NameNotResolved,
        "timedout" => ErrorReason::TimedOut,
        _ => ErrorReason::Failed,
    }
}

fn console_level(kind: &runtime::ConsoleApiCalledType) -> ConsoleLevel {
    use runtime::ConsoleApiCalledType as Kind;

    match kind {
        Kind::Debug => ConsoleLevel::Debug,
        Kind::Info => ConsoleLevel::Info,
        Kind::Warning => ConsoleLevel::Warning,
        Kind::Error | Kind::Assert => ConsoleLevel::Error,
        _ => ConsoleLevel::Log,
    }
}

/// Joins console arguments the way the console displays them
fn console_text(args: &[runtime::RemoteObject]) -> String {
    args.iter()
        .map(|arg| match (&arg.value, &arg.description) {
            (Some(Value::String(text)), _) => text.clone(),
            (Some(value), _) => value.to_string(),
            (None, Some(description)) => description.clone(),
            (None, None) => String::new(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn dialog_kind(kind: &page::DialogType) -> DialogKind {
    match kind {
        page::DialogType::Alert => DialogKind::Alert,
        page::DialogType::Confirm => DialogKind::Confirm,
        page::DialogType::Prompt => DialogKind::Prompt,
        page::DialogType::Beforeunload => DialogKind::BeforeUnload,
    }
}
