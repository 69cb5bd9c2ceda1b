//! Page preparation
//!
//! Eight independent setup operations run concurrently before navigation.
//! The first failure aborts the whole group; nothing is retried.

use crate::config::{CrawlConfig, DeviceProfile};
use crate::driver::PageDriver;
use crate::{DriverResult, SumiError};
use std::fmt;
use std::future::Future;

/// Init script that keeps every navigation in the current tab
pub const BLOCK_NEW_TABS_SCRIPT: &str = "(() => { \
    window.open = function (url) { \
        if (url) { window.location.assign(url); } \
        return window; \
    }; \
})();";

/// One of the preparation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrepareStep {
    BlockNewTabs,
    Authenticate,
    Emulate,
    RedirectPolicy,
    Cache,
    UserAgent,
    ExtraHeaders,
    JavaScript,
}

impl PrepareStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockNewTabs => "block-new-tabs",
            Self::Authenticate => "authenticate",
            Self::Emulate => "emulate",
            Self::RedirectPolicy => "redirect-policy",
            Self::Cache => "cache",
            Self::UserAgent => "user-agent",
            Self::ExtraHeaders => "extra-headers",
            Self::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for PrepareStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

async fn step<F>(step: PrepareStep, operation: F) -> Result<(), SumiError>
where
    F: Future<Output = DriverResult<()>>,
{
    operation.await.map_err(|source| {
        tracing::warn!("Preparation step {} failed: {}", step, source);
        SumiError::Preparation { step, source }
    })
}

/// Applies the crawl settings to the page
///
/// Optional settings that are absent resolve immediately without touching
/// the driver. Request interception is switched on exactly when redirects
/// must not be followed automatically.
pub async fn prepare<D>(driver: &D, config: &CrawlConfig) -> Result<(), SumiError>
where
    D: PageDriver + ?Sized,
{
    let device: Option<DeviceProfile> = config
        .device
        .as_ref()
        .map(|setting| setting.resolve())
        .transpose()?;

    tokio::try_join!(
        step(
            PrepareStep::BlockNewTabs,
            driver.evaluate_on_new_document(BLOCK_NEW_TABS_SCRIPT),
        ),
        step(PrepareStep::Authenticate, async {
            match &config.credentials {
                Some(credentials) => driver.authenticate(credentials).await,
                None => Ok(()),
            }
        }),
        step(PrepareStep::Emulate, async {
            match &device {
                Some(device) => driver.emulate(device).await,
                None => Ok(()),
            }
        }),
        step(
            PrepareStep::RedirectPolicy,
            driver.set_request_interception(!config.follow_redirects),
        ),
        step(
            PrepareStep::Cache,
            driver.set_cache_enabled(config.browser_cache),
        ),
        step(PrepareStep::UserAgent, async {
            match &config.user_agent {
                Some(agent) => driver.set_user_agent(agent).await,
                None => Ok(()),
            }
        }),
        step(PrepareStep::ExtraHeaders, async {
            match config.effective_extra_headers() {
                Some(headers) => driver.set_extra_headers(headers).await,
                None => Ok(()),
            }
        }),
        step(
            PrepareStep::JavaScript,
            driver.set_javascript_enabled(config.javascript_enabled),
        ),
    )?;

    Ok(())
}
