//! Output module for crawl records
//!
//! This module handles:
//! - Serializing redirect and extracted records to JSON
//! - Writing them to standard output or a file

mod json;
mod traits;

pub use json::{format_outcome, JsonOutput};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::crawler::CrawlOutcome;
use std::path::Path;

/// Writes a crawl record to a file, or to standard output when no path is given
///
/// # Arguments
///
/// * `outcome` - The crawl record
/// * `path` - Destination file, created or truncated
///
/// # Returns
///
/// * `Ok(())` - Record written and flushed
/// * `Err(OutputError)` - Serialization or IO failed
pub fn write_outcome(outcome: &CrawlOutcome, path: Option<&Path>) -> OutputResult<()> {
    match path {
        Some(path) => {
            let mut output = JsonOutput::create(path)?;
            output.write_outcome(outcome)?;
            output.finish()?;
            tracing::info!("Wrote crawl record to {}", path.display());
        }
        None => {
            let mut output = JsonOutput::stdout();
            output.write_outcome(outcome)?;
            output.finish()?;
        }
    }
    Ok(())
}
