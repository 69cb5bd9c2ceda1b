//! Sumi-Page: a single-page crawl pipeline
//!
//! This crate drives one page through preparation, navigation, a redirect
//! branch and concurrent extraction, and produces a normalized crawl record
//! (timing, response/request metadata, redirect history, evaluation result,
//! screenshot, links and body text).
//!
//! The browser itself sits behind the [`driver::PageDriver`] trait. A
//! JavaScript-less HTTP driver (`driver::StaticDriver`) ships with the crate;
//! the `browser` feature adds a Chromium driver (`driver::BrowserDriver`).

pub mod config;
pub mod crawler;
pub mod driver;
pub mod output;
pub mod projector;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Sumi-Page operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preparation step '{step}' failed: {source}")]
    Preparation {
        step: crawler::PrepareStep,
        source: DriverError,
    },

    #[error("Navigation to {url} failed: {source}")]
    Navigation { url: String, source: DriverError },

    #[error("Wait gate failed: {0}")]
    WaitGate(#[source] DriverError),

    #[error("Extraction step '{step}' failed: {source}")]
    Extraction {
        step: crawler::ExtractStep,
        source: DriverError,
    },

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crawler::CrawlPhase,
        to: crawler::CrawlPhase,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown device profile: {0}")]
    UnknownDevice(String),
}

/// Errors raised by a page driver capability
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} is not supported by this page driver")]
    Unsupported(&'static str),

    #[error("Too many redirects from {url}")]
    TooManyRedirects { url: String },

    #[error("Request to {url} was aborted: {reason}")]
    Aborted { url: String, reason: String },

    #[error("Frame {frame} is not accessible from the top document")]
    FrameAccess { frame: String },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias for Sumi-Page operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{crawl, CrawlOutcome, CrawlPhase, CrawlResult, Crawler, RedirectResult};
pub use driver::{PageDriver, StaticDriver};

#[cfg(feature = "browser")]
pub use driver::{BrowserDriver, BrowserOptions};
