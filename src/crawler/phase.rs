/// Crawl phase definitions
///
/// A crawl moves through these phases exactly once, in order:
/// `Init -> Prepared -> Navigated -> (Redirected | Extracted)`.
use crate::SumiError;
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Nothing has been sent to the page yet
    Init,

    /// All setup operations succeeded
    Prepared,

    /// Navigation returned a response
    Navigated,

    // ===== Terminal Phases =====
    /// The response was a redirect; no extraction ran
    Redirected,

    /// Extraction finished and the record was assembled
    Extracted,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redirected | Self::Extracted)
    }

    /// Returns true if moving from this phase to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Prepared)
                | (Self::Prepared, Self::Navigated)
                | (Self::Navigated, Self::Redirected)
                | (Self::Navigated, Self::Extracted)
        )
    }

    /// Moves to `next`, or fails with `InvalidTransition`
    pub fn transition(self, next: CrawlPhase) -> Result<CrawlPhase, SumiError> {
        if self.can_transition_to(next) {
            tracing::debug!("Crawl phase {} -> {}", self, next);
            Ok(next)
        } else {
            Err(SumiError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Prepared => "prepared",
            Self::Navigated => "navigated",
            Self::Redirected => "redirected",
            Self::Extracted => "extracted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
