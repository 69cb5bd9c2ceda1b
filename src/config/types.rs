use crate::config::devices::DeviceSetting;
use crate::driver::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

fn default_true() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    DEFAULT_NAVIGATION_TIMEOUT_MS
}

fn default_wait_timeout() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

/// Main configuration structure for a single crawl
///
/// Only `url` is required; everything else falls back to browser-like
/// defaults (follow redirects, cache on, JavaScript on, no waiting, no
/// evaluation, no screenshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Target URL of the crawl
    pub url: String,

    /// Navigation timeout and readiness policy
    #[serde(default)]
    pub navigation: NavigationOptions,

    /// HTTP authentication credentials
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Device to emulate, either a preset name or an inline profile
    #[serde(default)]
    pub device: Option<DeviceSetting>,

    /// Let the browser follow redirects on its own. When false, request
    /// interception is switched on and redirects are handled manually.
    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    /// Enable the browser's HTTP cache
    #[serde(default = "default_true")]
    pub browser_cache: bool,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub extra_headers: Option<HeaderMap>,

    /// Enable JavaScript execution in the page
    #[serde(default = "default_true")]
    pub javascript_enabled: bool,

    /// Optional wait gate between navigation and extraction
    #[serde(default)]
    pub wait_for: Option<WaitFor>,

    /// JavaScript function source evaluated in the page; its return value
    /// becomes the `result` of the crawl
    #[serde(default)]
    pub evaluate_page: Option<String>,

    /// Inject jQuery before evaluating the page
    #[serde(default)]
    pub jquery: bool,

    /// Screenshot capture options; no screenshot when absent
    #[serde(default)]
    pub screenshot: Option<ScreenshotOptions>,
}

impl CrawlConfig {
    /// Creates a configuration for `url` with every option at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            navigation: NavigationOptions::default(),
            credentials: None,
            device: None,
            follow_redirects: true,
            browser_cache: true,
            user_agent: None,
            extra_headers: None,
            javascript_enabled: true,
            wait_for: None,
            evaluate_page: None,
            jquery: false,
            screenshot: None,
        }
    }

    /// Extra headers that should actually be applied (present and non-empty)
    pub fn effective_extra_headers(&self) -> Option<&HeaderMap> {
        self.extra_headers.as_ref().filter(|headers| !headers.is_empty())
    }
}

/// Navigation behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NavigationOptions {
    /// Maximum navigation time (milliseconds)
    #[serde(default = "default_navigation_timeout")]
    pub timeout_ms: u64,

    /// When navigation counts as finished
    #[serde(default)]
    pub wait_until: WaitUntil,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            wait_until: WaitUntil::default(),
        }
    }
}

/// Page lifecycle event that ends a navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitUntil {
    #[default]
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle0")]
    NetworkIdle0,
    #[serde(rename = "networkidle2")]
    NetworkIdle2,
}

/// HTTP authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Wait gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitFor {
    /// What to wait for
    pub condition: WaitCondition,

    /// Timeout and visibility options for selector/function waits
    #[serde(default)]
    pub options: WaitOptions,

    /// Extra arguments passed to a predicate function
    #[serde(default)]
    pub args: Vec<Value>,
}

/// The three kinds of wait gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// Wait until a CSS selector matches
    Selector(String),
    /// Wait until a JavaScript predicate returns a truthy value
    Function(String),
    /// Wait a fixed number of milliseconds
    Timeout(u64),
}

/// Options for selector and function waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitOptions {
    /// Maximum wait time (milliseconds)
    #[serde(default = "default_wait_timeout")]
    pub timeout_ms: u64,

    /// Selector must match a visible element
    #[serde(default)]
    pub visible: bool,

    /// Selector must match nothing (or only hidden elements)
    #[serde(default)]
    pub hidden: bool,

    /// Predicate polling interval (milliseconds); animation-frame polling when absent
    #[serde(default)]
    pub polling_ms: Option<u64>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            visible: false,
            hidden: false,
            polling_ms: None,
        }
    }
}

/// Screenshot capture options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScreenshotOptions {
    #[serde(default)]
    pub format: ImageFormat,

    /// JPEG quality (0-100)
    #[serde(default)]
    pub quality: Option<u8>,

    /// Capture the full scrollable page instead of the viewport
    #[serde(default)]
    pub full_page: bool,

    /// Transparent background instead of the default white
    #[serde(default)]
    pub omit_background: bool,

    /// Capture only this region
    #[serde(default)]
    pub clip: Option<Clip>,
}

/// Screenshot image encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

/// Rectangular screenshot region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
