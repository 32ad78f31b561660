//! Stored-file descriptor and its derived artifacts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Coarse bucket a file falls into, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Documents,
    Images,
    Videos,
    Archives,
    Audio,
    Other,
}

impl FileCategory {
    /// First matching bucket; unmatched extensions fall into `Other`.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.to_lowercase();
        let ext = ext.as_str();
        if constants::DOCUMENT_EXTENSIONS.contains(&ext) {
            FileCategory::Documents
        } else if constants::IMAGE_EXTENSIONS.contains(&ext) {
            FileCategory::Images
        } else if constants::VIDEO_EXTENSIONS.contains(&ext) {
            FileCategory::Videos
        } else if constants::ARCHIVE_EXTENSIONS.contains(&ext) {
            FileCategory::Archives
        } else if constants::AUDIO_EXTENSIONS.contains(&ext) {
            FileCategory::Audio
        } else {
            FileCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Documents => "documents",
            FileCategory::Images => "images",
            FileCategory::Videos => "videos",
            FileCategory::Archives => "archives",
            FileCategory::Audio => "audio",
            FileCategory::Other => "other",
        }
    }
}

/// An ingested file as it sits on disk.
///
/// `stored_filename` is the randomized on-disk name; it always carries the
/// same (lowercased) extension as `original_filename`. `file_path` points at
/// the current on-disk representation, which ends in `.gz` when compressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: PathBuf,
    pub byte_size: u64,
    pub mime_type: String,
    pub category: FileCategory,
    /// SHA-256 over the full byte stream, hex-encoded. Computed for every
    /// file; not currently used for dedup.
    pub content_hash: String,
}

/// Result of the conditional compression step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompressionOutcome {
    pub is_compressed: bool,
    pub original_size: u64,
    pub final_size: u64,
}

impl CompressionOutcome {
    /// Outcome for a file that was left untouched.
    pub fn uncompressed(size: u64) -> Self {
        Self {
            is_compressed: false,
            original_size: size,
            final_size: size,
        }
    }

    /// Percentage of bytes saved; 0 for uncompressed files.
    pub fn ratio_percent(&self) -> f64 {
        if !self.is_compressed || self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.final_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Derived images for a stored file. Paths are set only when generation
/// succeeded; generation never fails the ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewArtifacts {
    pub thumbnail_path: Option<PathBuf>,
    pub preview_path: Option<PathBuf>,
}

impl PreviewArtifacts {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_preview(&self) -> bool {
        self.thumbnail_path.is_some() || self.preview_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_extension() {
        assert_eq!(FileCategory::from_extension("pdf"), FileCategory::Documents);
        assert_eq!(FileCategory::from_extension("JPG"), FileCategory::Images);
        assert_eq!(FileCategory::from_extension("mkv"), FileCategory::Videos);
        assert_eq!(FileCategory::from_extension("tar"), FileCategory::Archives);
        assert_eq!(FileCategory::from_extension("flac"), FileCategory::Audio);
        assert_eq!(FileCategory::from_extension("exe"), FileCategory::Other);
        assert_eq!(FileCategory::from_extension(""), FileCategory::Other);
    }

    #[test]
    fn test_compression_ratio() {
        let outcome = CompressionOutcome {
            is_compressed: true,
            original_size: 1000,
            final_size: 400,
        };
        assert!((outcome.ratio_percent() - 60.0).abs() < f64::EPSILON);

        let untouched = CompressionOutcome::uncompressed(1000);
        assert_eq!(untouched.ratio_percent(), 0.0);
        assert_eq!(untouched.final_size, 1000);
    }

    #[test]
    fn test_preview_artifacts_presence() {
        assert!(!PreviewArtifacts::none().has_preview());

        let with_thumb = PreviewArtifacts {
            thumbnail_path: Some(PathBuf::from("/thumbnails/thumb_a.jpg")),
            preview_path: None,
        };
        assert!(with_thumb.has_preview());

        let with_preview = PreviewArtifacts {
            thumbnail_path: None,
            preview_path: Some(PathBuf::from("/previews/preview_a.jpg")),
        };
        assert!(with_preview.has_preview());
    }
}
