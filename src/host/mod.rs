//! Collaborator contracts consumed by the session
//!
//! Dialogs, persistence, and confirmation prompts are environment
//! capabilities. One implementation of each is chosen at startup and
//! injected into the session; the session never branches on the
//! environment itself.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod events;
pub mod native;

/// Native file pickers. `None` means the user cancelled the dialog.
pub trait FilePicker {
    fn open_dialog(&self) -> Option<PathBuf>;
    fn save_dialog(&self, default_name: &str) -> Option<PathBuf>;
}

/// Reads and writes document files. Failures may be any error shape; the
/// session maps them into [`FileOpError`].
pub trait FilePersistence {
    /// Read a file, returning the path actually read and its content
    fn read(&self, path: &Path) -> anyhow::Result<(PathBuf, String)>;
    /// Write content, returning the path actually written
    fn write(&self, path: &Path, content: &str) -> anyhow::Result<PathBuf>;
}

/// Modal yes/no confirmation. Returns `true` when the user chose to
/// continue.
pub trait ConfirmationPrompt {
    fn ask(&self, message: &str) -> bool;
}

/// Which file operation an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Open,
    Save,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAction::Open => f.write_str("open"),
            FileAction::Save => f.write_str("save"),
        }
    }
}

/// Backend-reported failure with a stable code, the shape the native
/// persistence layer produces
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct IoFailure {
    pub code: &'static str,
    pub message: String,
}

/// The error taxonomy of every file-affecting operation.
///
/// Nothing here is fatal: each variant surfaces as transient status text and
/// the document model is never left partially updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileOpError {
    /// User aborted a picker or declined a prompt
    #[error("File {0} was cancelled.")]
    Cancelled(FileAction),
    /// A collaborator reported a failure
    #[error("File {action} failed: {message}")]
    Failed {
        action: FileAction,
        code: Option<&'static str>,
        message: String,
    },
    /// A collaborator failed without a usable message
    #[error("File {0} failed: Unknown file operation error.")]
    Unknown(FileAction),
}

impl FileOpError {
    /// Map an arbitrary collaborator error into the taxonomy
    pub fn from_any(action: FileAction, error: anyhow::Error) -> Self {
        let error = match error.downcast::<FileOpError>() {
            Ok(known) => return known,
            Err(other) => other,
        };
        match error.downcast::<IoFailure>() {
            Ok(io) => FileOpError::Failed {
                action,
                code: Some(io.code),
                message: io.message,
            },
            Err(other) => {
                let message = other.to_string();
                if message.trim().is_empty() {
                    FileOpError::Unknown(action)
                } else {
                    FileOpError::Failed {
                        action,
                        code: None,
                        message,
                    }
                }
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FileOpError::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failure_maps_to_failed_with_code() {
        let err = anyhow::Error::new(IoFailure {
            code: "FILE_NOT_FOUND",
            message: "Open failed: File does not exist.".to_string(),
        });
        let mapped = FileOpError::from_any(FileAction::Open, err);
        assert_eq!(
            mapped,
            FileOpError::Failed {
                action: FileAction::Open,
                code: Some("FILE_NOT_FOUND"),
                message: "Open failed: File does not exist.".to_string(),
            }
        );
    }

    #[test]
    fn known_error_passes_through_unchanged() {
        let original = FileOpError::Cancelled(FileAction::Save);
        let mapped = FileOpError::from_any(FileAction::Open, anyhow::Error::new(original.clone()));
        assert_eq!(mapped, original);
    }

    #[test]
    fn arbitrary_error_maps_to_failed_with_its_message() {
        let mapped = FileOpError::from_any(FileAction::Save, anyhow::anyhow!("disk full"));
        assert_eq!(
            mapped,
            FileOpError::Failed {
                action: FileAction::Save,
                code: None,
                message: "disk full".to_string(),
            }
        );
    }

    #[test]
    fn message_less_error_maps_to_unknown() {
        let mapped = FileOpError::from_any(FileAction::Open, anyhow::anyhow!("   "));
        assert_eq!(mapped, FileOpError::Unknown(FileAction::Open));
        assert_eq!(
            mapped.to_string(),
            "File open failed: Unknown file operation error."
        );
    }

    #[test]
    fn display_includes_the_action() {
        assert_eq!(
            FileOpError::Cancelled(FileAction::Open).to_string(),
            "File open was cancelled."
        );
        let failed = FileOpError::Failed {
            action: FileAction::Save,
            code: None,
            message: "Permission denied.".to_string(),
        };
        assert_eq!(failed.to_string(), "File save failed: Permission denied.");
    }
}
