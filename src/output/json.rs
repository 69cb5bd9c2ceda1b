//! JSON output
//!
//! Records are written as one JSON document each, pretty-printed by default,
//! followed by a newline.

use crate::crawler::CrawlOutcome;
use crate::output::traits::{OutputHandler, OutputResult};
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

/// Writes crawl records as JSON to any writer
pub struct JsonOutput<W: Write> {
    writer: W,
    pretty: bool,
}

impl JsonOutput<Stdout> {
    /// JSON on standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl JsonOutput<BufWriter<File>> {
    /// JSON into a newly created (or truncated) file
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    /// Single-line output instead of pretty-printing
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputHandler for JsonOutput<W> {
    fn write_outcome(&mut self, outcome: &CrawlOutcome) -> OutputResult<()> {
        let json = format_outcome(outcome, self.pretty)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Serializes a crawl record to a JSON string
pub fn format_outcome(outcome: &CrawlOutcome, pretty: bool) -> OutputResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(outcome)?
    } else {
        serde_json::to_string(outcome)?
    };
    Ok(json)
}
