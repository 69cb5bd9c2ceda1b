//! Page event logging
//!
//! Registered on the page once per crawl. Console output and page errors are
//! forwarded to `tracing`; dialogs are always dismissed so they can never
//! block navigation or evaluation.

use crate::driver::{ConsoleMessage, Dialog, DialogAction, PageObserver};

/// Forwards page events to the log
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    url: String,
}

impl LoggingObserver {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl PageObserver for LoggingObserver {
    fn on_console(&self, message: &ConsoleMessage) {
        tracing::debug!(
            url = %self.url,
            level = ?message.level,
            "console: {}",
            message.text
        );
    }

    fn on_page_error(&self, error: &str) {
        tracing::warn!(url = %self.url, "Uncaught page error: {}", error);
    }

    fn on_dialog(&self, dialog: &Dialog) -> DialogAction {
        tracing::info!(
            url = %self.url,
            "Dismissing {:?} dialog: {}",
            dialog.kind,
            dialog.message
        );
        DialogAction::Dismiss
    }
}
