//! Document model for the single open markdown file

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Fallback display name for a document that was never persisted.
pub const UNTITLED_NAME: &str = "Untitled.md";

/// The one open document of a session
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentModel {
    /// File path; `None` until the document is first persisted
    pub path: Option<PathBuf>,
    /// Full document text
    pub content: String,
    /// Whether unsaved local modifications exist
    pub is_dirty: bool,
    /// Time of the last content mutation or successful open/save
    pub updated_at: SystemTime,
}

impl DocumentModel {
    /// Create the initial, never-persisted document
    pub fn new() -> Self {
        Self {
            path: None,
            content: String::new(),
            is_dirty: false,
            updated_at: SystemTime::now(),
        }
    }

    /// Build the model for a freshly opened file
    pub fn opened(path: PathBuf, content: String) -> Self {
        Self {
            path: Some(path),
            content,
            is_dirty: false,
            updated_at: SystemTime::now(),
        }
    }

    /// Apply a local edit: replaces content and marks the document dirty
    pub fn apply_edit(&mut self, content: String) {
        self.content = content;
        self.is_dirty = true;
        self.updated_at = SystemTime::now();
    }

    /// Record a successful save to `path`
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.is_dirty = false;
        self.updated_at = SystemTime::now();
    }

    /// File name to display in the status bar
    pub fn display_name(&self) -> String {
        display_name(self.path.as_deref())
    }

    /// UTF-8 size of the content in bytes
    pub fn byte_size(&self) -> usize {
        self.content.len()
    }

    /// Word count of the content
    pub fn word_count(&self) -> usize {
        count_words(&self.content)
    }

    /// Status bar label for the dirty indicator
    pub fn dirty_label(&self) -> &'static str {
        if self.is_dirty {
            "Dirty ● Unsaved"
        } else {
            "Dirty ○ Saved"
        }
    }
}

impl Default for DocumentModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Which panes are visible in the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Edit,
    Preview,
    Split,
}

impl ViewMode {
    /// Whether this mode shows the rendered preview pane
    pub fn shows_preview(self) -> bool {
        matches!(self, ViewMode::Preview | ViewMode::Split)
    }
}

/// 1-based cursor position reported by the editor widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub line: u32,
    pub column: u32,
}

impl Default for CursorPos {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

fn display_name(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNTITLED_NAME.to_string())
}

/// Count words: CJK characters count individually, Latin runs count once per
/// whitespace-separated token.
pub fn count_words(content: &str) -> usize {
    if content.trim().is_empty() {
        return 0;
    }

    let cjk_count = content.chars().filter(|&c| is_cjk(c)).count();
    let latin_word_count = content
        .split_whitespace()
        .filter(|token| token.chars().any(is_latin))
        .count();

    cjk_count + latin_word_count
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'    // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'  // CJK Extension A
        | '\u{F900}'..='\u{FAFF}'  // CJK Compatibility Ideographs
        | '\u{3040}'..='\u{309F}'  // Hiragana
        | '\u{30A0}'..='\u{30FF}'  // Katakana
        | '\u{AC00}'..='\u{D7AF}'  // Hangul Syllables
        | '\u{1100}'..='\u{11FF}'  // Hangul Jamo
    )
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c, '\u{00C0}'..='\u{024F}') // Latin-1 Supplement through Extended-B
}
