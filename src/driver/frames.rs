//! Frame tree snapshots

use std::fmt;

/// Identifies one frame of the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `<frame>` or `<iframe>` element found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameElement {
    /// Raw `src` attribute, exactly as written
    pub src: Option<String>,
    /// Frame hosting the element's content document, when the driver knows it
    pub frame: Option<FrameId>,
}

/// Link-relevant view of one frame's document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameDocument {
    pub url: String,
    /// Raw `href` attribute of every `<a href>` element, in document order
    pub hrefs: Vec<String>,
    /// Nested frame elements, in document order
    pub frames: Vec<FrameElement>,
}
