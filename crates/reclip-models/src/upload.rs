//! Client-side upload constraints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::format_file_size;

/// Default maximum upload size (500 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Extensions accepted by the upload zone.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm", "mkv"];

/// Validation failures detected before any network attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadValidationError {
    #[error("File \"{file_name}\" is empty")]
    Empty { file_name: String },

    #[error("File \"{file_name}\" is too large ({size}); the maximum is {max}")]
    TooLarge {
        file_name: String,
        size: String,
        max: String,
    },

    #[error("File \"{file_name}\" has unsupported type \"{extension}\"; allowed: {allowed}")]
    UnsupportedExtension {
        file_name: String,
        extension: String,
        allowed: String,
    },
}

/// Size and type limits for uploaded files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConstraints {
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl UploadConstraints {
    /// Check a file's name and size against the limits.
    pub fn validate(&self, file_name: &str, size_bytes: u64) -> Result<(), UploadValidationError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !self
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
        {
            return Err(UploadValidationError::UnsupportedExtension {
                file_name: file_name.to_string(),
                extension,
                allowed: self.allowed_extensions.join(", "),
            });
        }

        if size_bytes == 0 {
            return Err(UploadValidationError::Empty {
                file_name: file_name.to_string(),
            });
        }

        if size_bytes > self.max_size_bytes {
            return Err(UploadValidationError::TooLarge {
                file_name: file_name.to_string(),
                size: format_file_size(size_bytes),
                max: format_file_size(self.max_size_bytes),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_supported_file() {
        let constraints = UploadConstraints::default();
        assert!(constraints.validate("clip.mp4", 10 * 1024 * 1024).is_ok());
        assert!(constraints.validate("Talk.MOV", 1).is_ok());
    }

    #[test]
    fn test_oversize_error_names_the_file() {
        let constraints = UploadConstraints {
            max_size_bytes: 1024 * 1024,
            ..Default::default()
        };
        let err = constraints.validate("huge.mp4", 2 * 1024 * 1024).unwrap_err();
        assert!(matches!(err, UploadValidationError::TooLarge { .. }));
        let message = err.to_string();
        assert!(message.contains("huge.mp4"));
        assert!(message.contains("2.00 MB"));
    }

    #[test]
    fn test_rejects_unknown_extension_and_empty_files() {
        let constraints = UploadConstraints::default();
        let err = constraints.validate("notes.txt", 10).unwrap_err();
        assert!(err.to_string().contains("notes.txt"));

        let err = constraints.validate("no_extension", 10).unwrap_err();
        assert!(matches!(err, UploadValidationError::UnsupportedExtension { .. }));

        let err = constraints.validate("blank.mp4", 0).unwrap_err();
        assert!(matches!(err, UploadValidationError::Empty { .. }));
    }
}
