//! Crawl records
//!
//! The two terminal shapes of a crawl. Serialized with camelCase keys; the
//! redirect shape carries only `timing`, `response` and `request`.

use crate::projector::{Projection, RedirectEntry};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Wall-clock bounds of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timing {
    /// Closes a crawl that began at `start`
    ///
    /// The end is clamped so `start <= end` holds even if the wall clock
    /// stepped backwards mid-crawl.
    pub fn finish(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Utc::now().max(start),
        }
    }
}

/// Record of a crawl whose target answered with a redirect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectResult {
    pub timing: Timing,
    pub response: Projection,
    pub request: Projection,
}

/// Record of a fully extracted crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub timing: Timing,
    pub response: Projection,
    pub request: Projection,
    pub redirect_chain: Vec<RedirectEntry>,
    /// Value returned by the page evaluation, null when none was configured
    pub result: Value,
    /// Screenshot bytes, base64 encoded in JSON
    #[serde(serialize_with = "serialize_screenshot")]
    pub screenshot: Option<Vec<u8>>,
    /// Absolute link URLs, no duplicates, in discovery order
    pub links: Vec<String>,
    /// Full body of the navigation response
    pub text: String,
}

/// Terminal value of a crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CrawlOutcome {
    Redirected(RedirectResult),
    Extracted(CrawlResult),
}

impl CrawlOutcome {
    pub fn timing(&self) -> &Timing {
        match self {
            Self::Redirected(record) => &record.timing,
            Self::Extracted(record) => &record.timing,
        }
    }

    pub fn response(&self) -> &Projection {
        match self {
            Self::Redirected(record) => &record.response,
            Self::Extracted(record) => &record.response,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirected(_))
    }

    /// The extracted record, if the crawl got that far
    pub fn extracted(&self) -> Option<&CrawlResult> {
        match self {
            Self::Extracted(record) => Some(record),
            Self::Redirected(_) => None,
        }
    }
}

fn serialize_screenshot<S: Serializer>(
    screenshot: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match screenshot {
        Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
        None => serializer.serialize_none(),
    }
}
