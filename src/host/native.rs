//! Desktop-backed collaborator implementations

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::host::{ConfirmationPrompt, FilePersistence, FilePicker, IoFailure};

const MARKDOWN_FILTER: [&str; 3] = ["md", "markdown", "txt"];

/// File dialogs backed by the native shell
pub struct NativeFilePicker;

impl FilePicker for NativeFilePicker {
    fn open_dialog(&self) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Markdown", &MARKDOWN_FILTER)
            .add_filter("All Files", &["*"])
            .pick_file()
    }

    fn save_dialog(&self, default_name: &str) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Markdown", &MARKDOWN_FILTER)
            .add_filter("All Files", &["*"])
            .set_file_name(default_name)
            .save_file()
    }
}

/// Native modal confirmation
pub struct NativePrompt;

impl ConfirmationPrompt for NativePrompt {
    fn ask(&self, message: &str) -> bool {
        let result = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Unsaved Changes")
            .set_description(message)
            .set_buttons(MessageButtons::OkCancelCustom(
                "Continue".to_string(),
                "Cancel".to_string(),
            ))
            .show();
        matches!(result, MessageDialogResult::Custom(choice) if choice == "Continue")
    }
}

/// Filesystem persistence with stable error codes
pub struct NativePersistence;

impl FilePersistence for NativePersistence {
    fn read(&self, path: &Path) -> Result<(PathBuf, String)> {
        let path = normalize_path(path)?;
        let content =
            std::fs::read_to_string(&path).map_err(|error| io_failure("Open failed: ", error))?;
        Ok((path, content))
    }

    fn write(&self, path: &Path, content: &str) -> Result<PathBuf> {
        let path = normalize_path(path)?;
        std::fs::write(&path, content).map_err(|error| io_failure("Save failed: ", error))?;
        Ok(path)
    }
}

fn normalize_path(path: &Path) -> Result<PathBuf> {
    let trimmed = path.to_string_lossy().trim().to_string();
    if trimmed.is_empty() {
        return Err(IoFailure {
            code: "INVALID_PATH",
            message: "Invalid file path. Please choose a valid path.".to_string(),
        }
        .into());
    }
    Ok(PathBuf::from(trimmed))
}

fn io_failure(action: &'static str, error: io::Error) -> anyhow::Error {
    let (code, detail) = match error.kind() {
        io::ErrorKind::NotFound => ("FILE_NOT_FOUND", "File does not exist."),
        io::ErrorKind::PermissionDenied => ("PERMISSION_DENIED", "Permission denied."),
        io::ErrorKind::InvalidData => ("INVALID_TEXT", "File is not valid UTF-8 text."),
        io::ErrorKind::AlreadyExists => ("ALREADY_EXISTS", "Target file already exists."),
        io::ErrorKind::WriteZero => ("WRITE_FAILED", "Failed to write file."),
        _ => ("IO_ERROR", "I/O error occurred."),
    };

    IoFailure {
        code,
        message: format!("{action}{detail}"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn code_of(error: anyhow::Error) -> &'static str {
        error
            .downcast::<IoFailure>()
            .map(|failure| failure.code)
            .unwrap_or("NOT_AN_IO_FAILURE")
    }

    #[test]
    fn normalize_path_rejects_empty_and_whitespace() {
        assert_eq!(code_of(normalize_path(Path::new("")).unwrap_err()), "INVALID_PATH");
        assert_eq!(
            code_of(normalize_path(Path::new("   \t ")).unwrap_err()),
            "INVALID_PATH"
        );
    }

    #[test]
    fn normalize_path_passes_valid_paths_through() {
        assert_eq!(
            normalize_path(Path::new("/tmp/test.md")).unwrap(),
            PathBuf::from("/tmp/test.md")
        );
    }

    #[test]
    fn read_missing_file_reports_file_not_found() {
        let err = NativePersistence
            .read(Path::new("/tmp/__blinkmd_nonexistent_test_file__.md"))
            .unwrap_err();
        assert_eq!(code_of(err), "FILE_NOT_FOUND");
    }

    #[test]
    fn read_returns_path_and_content() {
        let path = env::temp_dir().join("blinkmd_test_open.md");
        fs::write(&path, "# Hello BlinkMD").unwrap();

        let (read_path, content) = NativePersistence.read(&path).unwrap();
        assert_eq!(content, "# Hello BlinkMD");
        assert!(read_path.ends_with("blinkmd_test_open.md"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn write_persists_content() {
        let path = env::temp_dir().join("blinkmd_test_save.md");
        let content = "Saved content 保存测试";

        let written = NativePersistence.write(&path, content).unwrap();
        assert_eq!(fs::read_to_string(&written).unwrap(), content);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn write_to_empty_path_reports_invalid_path() {
        let err = NativePersistence.write(Path::new(""), "content").unwrap_err();
        assert_eq!(code_of(err), "INVALID_PATH");
    }
}
