//! Output handler traits and errors
//!
//! An output handler receives the terminal record of a crawl and writes it
//! somewhere: a terminal, a file, or an in-memory buffer in tests.

use crate::crawler::CrawlOutcome;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize crawl record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
pub trait OutputHandler {
    /// Writes one crawl record
    ///
    /// # Arguments
    ///
    /// * `outcome` - The redirect or extracted record of a finished crawl
    fn write_outcome(&mut self, outcome: &CrawlOutcome) -> OutputResult<()>;

    /// Flushes anything still buffered
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
