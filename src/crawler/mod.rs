//! Crawler module for single-page crawls
//!
//! This module contains the crawl pipeline, including:
//! - Page preparation and request interception policy
//! - Navigation and the redirect branch
//! - The optional wait gate
//! - Concurrent extraction and cross-frame link collection
//! - Crawl records and the phase state machine

mod extract;
mod intercept;
mod links;
mod observer;
mod orchestrator;
mod phase;
mod prepare;
mod record;
mod wait;

pub use extract::{extract, ExtractStep, Extraction, JQUERY_URL};
pub use intercept::{ContinueUnmodified, CrawlInterceptor, PreBrowserRequest};
pub use links::{LinkCollector, DEFAULT_MAX_FRAME_DEPTH};
pub use observer::LoggingObserver;
pub use orchestrator::Crawler;
pub use phase::CrawlPhase;
pub use prepare::{prepare, PrepareStep, BLOCK_NEW_TABS_SCRIPT};
pub use record::{CrawlOutcome, CrawlResult, RedirectResult, Timing};
pub use wait::wait_gate;

use crate::config::CrawlConfig;
use crate::driver::PageDriver;
use crate::SumiError;

/// Runs a complete crawl of one page
///
/// This is the main entry point for a crawl. It will:
/// 1. Validate the configuration and register page handlers
/// 2. Prepare the page
/// 3. Navigate to the target URL
/// 4. Return a redirect record on a 3xx response, or
/// 5. Wait, extract and return the full crawl record
///
/// # Arguments
///
/// * `driver` - The page to crawl with
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The crawl reached a terminal phase
/// * `Err(SumiError)` - Configuration, preparation, navigation, wait or
///   extraction failed
pub async fn crawl<D: PageDriver>(driver: D, config: CrawlConfig) -> Result<CrawlOutcome, SumiError> {
    Crawler::new(driver, config)?.run().await
}
