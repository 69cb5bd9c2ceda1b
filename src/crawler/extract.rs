//! Post-load extraction
//!
//! Four independent operations run concurrently once the page is loaded:
//! page evaluation, screenshot capture, link collection and body text
//! retrieval. Extraction is all-or-nothing: the first failure fails the
//! crawl and no partial record is produced.

use crate::config::CrawlConfig;
use crate::crawler::links::LinkCollector;
use crate::driver::{HttpResponse, PageDriver, ScriptTag};
use crate::{DriverResult, SumiError};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use url::Url;

/// jQuery build injected before page evaluation when requested
pub const JQUERY_URL: &str = "https://code.jquery.com/jquery-3.7.1.min.js";

/// One of the extraction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractStep {
    Scrape,
    Screenshot,
    Links,
    Text,
}

impl ExtractStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Screenshot => "screenshot",
            Self::Links => "links",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ExtractStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outputs of the four extraction operations
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub result: Value,
    pub screenshot: Option<Vec<u8>>,
    pub links: Vec<String>,
    pub text: String,
}

async fn step<T, F>(step: ExtractStep, operation: F) -> Result<T, SumiError>
where
    F: Future<Output = DriverResult<T>>,
{
    operation.await.map_err(|source| {
        tracing::warn!("Extraction step {} failed: {}", step, source);
        SumiError::Extraction { step, source }
    })
}

/// Runs the configured page evaluation
///
/// jQuery is injected first when asked for, so the evaluated function can
/// rely on it. Without an evaluation function the result is `null`.
async fn scrape<D>(driver: &D, config: &CrawlConfig) -> DriverResult<Value>
where
    D: PageDriver + ?Sized,
{
    if config.jquery {
        driver
            .add_script_tag(&ScriptTag::Url(JQUERY_URL.to_string()))
            .await?;
    }

    match &config.evaluate_page {
        Some(function) => driver.evaluate(function, &[]).await,
        None => Ok(Value::Null),
    }
}

/// Runs all four extraction operations against the loaded page
pub async fn extract<D>(
    driver: &D,
    config: &CrawlConfig,
    base: &Url,
    response: &HttpResponse,
) -> Result<Extraction, SumiError>
where
    D: PageDriver + ?Sized,
{
    let (result, screenshot, links, text) = tokio::try_join!(
        step(ExtractStep::Scrape, scrape(driver, config)),
        step(ExtractStep::Screenshot, async {
            match &config.screenshot {
                Some(options) => driver.screenshot(options).await.map(Some),
                None => Ok(None),
            }
        }),
        step(ExtractStep::Links, async {
            LinkCollector::new(driver, base.clone()).collect().await
        }),
        step(ExtractStep::Text, driver.response_text(response)),
    )?;

    Ok(Extraction {
        result,
        screenshot,
        links,
        text,
    })
}
