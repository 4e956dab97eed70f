//! Drag-and-drop validation for the workspace region

use std::path::{Path, PathBuf};

/// File extensions accepted from a drop, matched case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

/// A point in host window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned bounds of the active workspace region
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.left
            && position.x <= self.right
            && position.y >= self.top
            && position.y <= self.bottom
    }
}

/// Drag-drop event reported by the host input layer
#[derive(Debug, Clone, PartialEq)]
pub enum DragDropEvent {
    Enter {
        position: Position,
        paths: Vec<PathBuf>,
    },
    Over {
        position: Position,
        paths: Vec<PathBuf>,
    },
    Drop {
        position: Position,
        paths: Vec<PathBuf>,
    },
    Leave,
}

/// What to do with a drop payload
#[derive(Debug, Clone, PartialEq)]
pub enum DropVerdict {
    /// Position landed outside the workspace under both coordinate
    /// interpretations; nothing happens, not even a status change
    OutsideWorkspace,
    /// No candidate carried a supported extension
    Unsupported,
    /// Open `path`; `ignored` counts every other dropped candidate
    Open { path: PathBuf, ignored: usize },
}

/// Whether a supported extension terminates `path`, case-insensitively
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Hit-test a drop position against the workspace bounds.
///
/// The host input layer may report physical or logical pixels, so the
/// position counts as inside if it lands in bounds either raw or divided by
/// the display scale factor.
pub fn position_in_workspace(bounds: Rect, position: Position, scale_factor: f64) -> bool {
    if bounds.contains(position) {
        return true;
    }
    if scale_factor <= 1.0 {
        return false;
    }
    bounds.contains(Position {
        x: position.x / scale_factor,
        y: position.y / scale_factor,
    })
}

/// Select at most one openable path from a drop payload.
///
/// Candidates are scanned in original order; the first with a supported
/// extension wins and every remaining candidate is reported as ignored,
/// whether or not it was itself supported.
pub fn resolve_drop(
    paths: &[PathBuf],
    position: Position,
    bounds: Rect,
    scale_factor: f64,
) -> DropVerdict {
    if !position_in_workspace(bounds, position, scale_factor) {
        return DropVerdict::OutsideWorkspace;
    }

    match paths.iter().find(|path| is_supported_path(path)) {
        Some(path) => DropVerdict::Open {
            path: path.clone(),
            ignored: paths.len() - 1,
        },
        None => DropVerdict::Unsupported,
    }
}
