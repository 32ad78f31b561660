//! Upload validation: extension allow-list and size caps, checked before
//! any disk write.

use akiba_core::constants::is_allowed_extension;
use akiba_storage::naming::file_extension;

/// Per-file validation errors. These are reported in a batch's error slot
/// and never abort the batch as a whole.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("File type not allowed: {extension}")]
    ExtensionNotAllowed { extension: String },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Upload validator.
pub struct UploadValidator {
    max_file_size: u64,
}

impl UploadValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn validate_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = file_extension(filename);
        if extension.is_empty() {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }
        if !is_allowed_extension(&extension) {
            return Err(ValidationError::ExtensionNotAllowed { extension });
        }
        Ok(())
    }

    /// All pre-write checks for one file.
    pub fn validate(&self, filename: &str, size: u64) -> Result<(), ValidationError> {
        self.validate_size(size)?;
        self.validate_extension(filename)?;
        Ok(())
    }
}
