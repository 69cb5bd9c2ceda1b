//! Integration tests for the crawl pipeline
//!
//! `orchestrator_tests` drive the crawler against an in-memory page driver;
//! `static_driver_tests` crawl wiremock servers end-to-end with the static
//! HTTP driver; `browser_driver_tests` do the same in Chromium when the
//! `browser` feature is on.

mod fake_driver;
mod orchestrator_tests;
mod static_driver_tests;
