//! Configuration module for Sumi-Page
//!
//! This module handles loading, parsing, and validating crawl configuration
//! files written in TOML.
//!
//! # Example
//!
//! ```no_run
//! use sumi_page::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawling {}", config.url);
//! ```

mod devices;
mod parser;
mod types;
mod validation;

// Re-export types
pub use devices::{device_names, lookup_device, DeviceProfile, DeviceSetting, Viewport};
pub use types::{
    Clip, CrawlConfig, Credentials, ImageFormat, NavigationOptions, ScreenshotOptions,
    WaitCondition, WaitFor, WaitOptions, WaitUntil,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
