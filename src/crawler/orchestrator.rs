//! Crawl orchestration
//!
//! A [`Crawler`] owns one page for one crawl and drives it through the crawl
//! phases:
//! 1. Prepare the page (eight concurrent setup operations)
//! 2. Navigate to the target
//! 3. Stop with a redirect record on a 3xx response
//! 4. Otherwise pass the wait gate and run the four extractions
//! 5. Assemble the crawl record

use crate::config::{validate, CrawlConfig};
use crate::crawler::extract::extract;
use crate::crawler::intercept::{ContinueUnmodified, CrawlInterceptor, PreBrowserRequest};
use crate::crawler::observer::LoggingObserver;
use crate::crawler::phase::CrawlPhase;
use crate::crawler::prepare::prepare;
use crate::crawler::record::{CrawlOutcome, CrawlResult, RedirectResult, Timing};
use crate::crawler::wait::wait_gate;
use crate::driver::PageDriver;
use crate::projector::{project_request, project_response, redirect_chain};
use crate::{ConfigError, SumiError};
use chrono::Utc;
use std::sync::Arc;
use url::Url;

/// Drives a single page through one crawl
pub struct Crawler<D: PageDriver> {
    driver: D,
    config: Arc<CrawlConfig>,
    base: Url,
    phase: CrawlPhase,
}

impl<D: PageDriver> Crawler<D> {
    /// Creates a crawler that lets every intercepted request continue
    ///
    /// # Arguments
    ///
    /// * `driver` - The page to crawl with; owned for the whole crawl
    /// * `config` - The crawl configuration, validated here
    pub fn new(driver: D, config: CrawlConfig) -> Result<Self, SumiError> {
        Self::with_hook(driver, config, Arc::new(ContinueUnmodified))
    }

    /// Creates a crawler with a custom interception hook
    ///
    /// The request handler and the logging observer are registered on the
    /// page right away; they stay active for the page's lifetime.
    pub fn with_hook(
        driver: D,
        config: CrawlConfig,
        hook: Arc<dyn PreBrowserRequest>,
    ) -> Result<Self, SumiError> {
        validate(&config)?;
        let base =
            Url::parse(&config.url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        let config = Arc::new(config);

        driver.set_request_handler(Arc::new(CrawlInterceptor::new(config.clone(), hook)));
        driver.add_observer(Arc::new(LoggingObserver::new(config.url.clone())));

        Ok(Self {
            driver,
            config,
            base,
            phase: CrawlPhase::Init,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    fn advance(&mut self, next: CrawlPhase) -> Result<(), SumiError> {
        self.phase = self.phase.transition(next)?;
        Ok(())
    }

    /// Runs the crawl to a terminal phase
    ///
    /// A crawler runs once; calling this again fails with
    /// `SumiError::InvalidTransition`.
    pub async fn run(&mut self) -> Result<CrawlOutcome, SumiError> {
        // Reject reruns before touching the page
        if !self.phase.can_transition_to(CrawlPhase::Prepared) {
            return Err(SumiError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Prepared,
            });
        }

        let start = Utc::now();
        tracing::info!("Crawling {}", self.config.url);

        prepare(&self.driver, &self.config).await?;
        self.advance(CrawlPhase::Prepared)?;

        let response = self
            .driver
            .navigate(&self.config.url, &self.config.navigation)
            .await
            .map_err(|source| {
                tracing::warn!("Navigation to {} failed: {}", self.config.url, source);
                SumiError::Navigation {
                    url: self.config.url.clone(),
                    source,
                }
            })?;
        self.advance(CrawlPhase::Navigated)?;

        let status = response.status();
        if response.head.is_redirect() {
            tracing::info!(
                "{} answered with redirect status {}, skipping extraction",
                self.config.url,
                status
            );
            let record = RedirectResult {
                response: project_response(Some(&response)),
                request: project_request(Some(response.request())),
                timing: Timing::finish(start),
            };
            self.advance(CrawlPhase::Redirected)?;
            return Ok(CrawlOutcome::Redirected(record));
        }

        wait_gate(&self.driver, self.config.wait_for.as_ref()).await?;

        let extraction = extract(&self.driver, &self.config, &self.base, &response).await?;

        let record = CrawlResult {
            response: project_response(Some(&response)),
            request: project_request(Some(response.request())),
            redirect_chain: redirect_chain(response.request()),
            result: extraction.result,
            screenshot: extraction.screenshot,
            links: extraction.links,
            text: extraction.text,
            timing: Timing::finish(start),
        };
        self.advance(CrawlPhase::Extracted)?;

        tracing::info!(
            "Crawled {} (status {}, {} links, {} redirects)",
            self.config.url,
            status,
            record.links.len(),
            record.redirect_chain.len()
        );

        Ok(CrawlOutcome::Extracted(record))
    }
}
