//! Link collection across the frame tree
//!
//! The collector walks the loaded document and every nested frame it can
//! reach, resolving each anchor `href` against the crawl URL. A frame whose
//! document is off-limits (cross-origin) contributes its raw `src` attribute
//! instead. The walk is bounded by a maximum frame depth and never enters the
//! same frame twice.

use crate::driver::{FrameElement, FrameId, PageDriver};
use crate::url::resolve_href;
use crate::{DriverError, DriverResult};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use url::Url;

/// Default limit on frame nesting below the top document
pub const DEFAULT_MAX_FRAME_DEPTH: usize = 16;

type WalkFuture<'a> = Pin<Box<dyn Future<Output = DriverResult<()>> + Send + 'a>>;

/// Links gathered so far plus the frames already entered
#[derive(Debug, Default)]
struct Walk {
    links: Vec<String>,
    visited: HashSet<FrameId>,
}

/// Collects hyperlinks from a page and its reachable frames
pub struct LinkCollector<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    base: Url,
    max_depth: usize,
}

impl<'a, D: PageDriver + ?Sized> LinkCollector<'a, D> {
    pub fn new(driver: &'a D, base: Url) -> Self {
        Self {
            driver,
            base,
            max_depth: DEFAULT_MAX_FRAME_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Absolute link URLs in discovery order, without duplicates
    pub async fn collect(&self) -> DriverResult<Vec<String>> {
        let main = self.driver.main_frame().await?;
        let mut walk = Walk::default();
        walk.visited.insert(main.clone());

        self.walk_frame(&main, 0, &mut walk).await?;

        let links = dedup(walk.links);
        tracing::debug!("Collected {} links from {}", links.len(), self.base);
        Ok(links)
    }

    fn walk_frame<'s>(
        &'s self,
        frame: &'s FrameId,
        depth: usize,
        walk: &'s mut Walk,
    ) -> WalkFuture<'s> {
        Box::pin(async move {
            let document = self.driver.frame_document(frame).await?;

            walk.links.extend(
                document
                    .hrefs
                    .iter()
                    .filter_map(|href| resolve_href(href, &self.base)),
            );

            for element in &document.frames {
                self.walk_child(element, depth + 1, walk).await?;
            }

            Ok(())
        })
    }

    async fn walk_child(
        &self,
        element: &FrameElement,
        depth: usize,
        walk: &mut Walk,
    ) -> DriverResult<()> {
        let Some(child) = &element.frame else {
            // No document of its own to read links from
            return Ok(());
        };

        if depth > self.max_depth {
            tracing::debug!("Skipping frame {} beyond depth {}", child, self.max_depth);
            return Ok(());
        }

        if !walk.visited.insert(child.clone()) {
            tracing::debug!("Skipping frame {} already visited", child);
            return Ok(());
        }

        match self.walk_frame(child, depth, walk).await {
            Err(DriverError::FrameAccess { frame }) => {
                tracing::debug!("Frame {} is cross-origin, recording its src", frame);
                if let Some(src) = &element.src {
                    walk.links.push(src.clone());
                }
                Ok(())
            }
            other => other,
        }
    }
}

/// Drops repeated entries, keeping the first occurrence
fn dedup(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(links.len());
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
