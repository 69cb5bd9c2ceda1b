//! URL handling module for Sumi-Page
//!
//! This module provides hyperlink resolution and origin comparison used by
//! the link collector, the request interceptor and the static driver.

mod origin;
mod resolve;

// Re-export main functions
pub use origin::{same_document, same_origin};
pub use resolve::resolve_href;
