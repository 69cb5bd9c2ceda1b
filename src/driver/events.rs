//! Page event observers
//!
//! Observers are registered once per page and live as long as the page does.
//! They never take part in the crawl phases: a driver calls them whenever the
//! page logs to the console, throws an uncaught error, or opens a dialog.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Console method that produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Debug,
    Info,
    Warning,
    Error,
}

/// A console message emitted by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Kind of JavaScript dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Alert,
    Confirm,
    Prompt,
    BeforeUnload,
}

/// A dialog opened by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub message: String,
    pub default_value: Option<String>,
}

/// How to close a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAction {
    Dismiss,
    Accept(Option<String>),
}

/// Receives page events
///
/// Every method has a default, so observers only implement what they need.
pub trait PageObserver: Send + Sync {
    fn on_console(&self, _message: &ConsoleMessage) {}

    fn on_page_error(&self, _error: &str) {}

    fn on_dialog(&self, _dialog: &Dialog) -> DialogAction {
        DialogAction::Dismiss
    }
}

/// Asks every observer about a dialog; any dismissal wins
///
/// A dialog nobody observes is dismissed too, so it can never stay open.
pub fn resolve_dialog(observers: &[Arc<dyn PageObserver>], dialog: &Dialog) -> DialogAction {
    let mut accepted = None;
    for observer in observers {
        match observer.on_dialog(dialog) {
            DialogAction::Dismiss => return DialogAction::Dismiss,
            action @ DialogAction::Accept(_) => accepted = Some(action),
        }
    }
    accepted.unwrap_or(DialogAction::Dismiss)
}
