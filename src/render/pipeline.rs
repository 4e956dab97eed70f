//! Debounced preview rendering
//!
//! Edits reschedule a single trailing-edge deadline; nothing renders on the
//! leading edge. The deadline is plain data polled from the session's tick,
//! so there is no hidden timer to leak and tests can drive time explicitly.

use std::time::{Duration, Instant};

use crate::render::markdown::{render_preview, MarkupConverter, EMPTY_PREVIEW_HTML};

/// Debounce for ordinary documents
pub const PREVIEW_DEBOUNCE: Duration = Duration::from_millis(120);
/// Debounce for large documents, to reduce render churn
pub const LARGE_FILE_PREVIEW_DEBOUNCE: Duration = Duration::from_millis(420);
/// UTF-8 byte size at which a document counts as large
pub const LARGE_FILE_THRESHOLD_BYTES: usize = 1024 * 1024;

/// Debounce delay for a document of `byte_size` UTF-8 bytes
pub fn debounce_delay(byte_size: usize) -> Duration {
    if byte_size >= LARGE_FILE_THRESHOLD_BYTES {
        LARGE_FILE_PREVIEW_DEBOUNCE
    } else {
        PREVIEW_DEBOUNCE
    }
}

/// Owns the display buffer and the pending render deadline
pub struct PreviewPipeline {
    converter: Box<dyn MarkupConverter>,
    html: String,
    deadline: Option<Instant>,
}

impl PreviewPipeline {
    pub fn new(converter: Box<dyn MarkupConverter>) -> Self {
        Self {
            converter,
            html: EMPTY_PREVIEW_HTML.to_string(),
            deadline: None,
        }
    }

    /// Display-ready markup for the preview pane
    pub fn html(&self) -> &str {
        &self.html
    }

    /// (Re)schedule a render; any pending deadline is replaced
    pub fn schedule(&mut self, byte_size: usize, now: Instant) {
        self.deadline = Some(now + debounce_delay(byte_size));
    }

    /// Deadline of the pending render, if one is scheduled
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Render `content` if the pending deadline has passed. Returns whether
    /// the display buffer was refreshed.
    pub fn poll(&mut self, content: &str, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.html = render_preview(content, self.converter.as_ref());
                true
            }
            _ => false,
        }
    }

    /// Render `content` immediately, cancelling any pending deadline. Used
    /// on mode switches so the first paint is never stale or empty.
    pub fn snapshot(&mut self, content: &str) {
        self.deadline = None;
        self.html = render_preview(content, self.converter.as_ref());
    }
}
