//! Configuration module
//!
//! Vault configuration is built explicitly (no lazily-initialized global):
//! construct once at process start and hand it to the services that need it.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::constants;

/// Configuration for the document vault and its processing pipelines.
#[derive(Clone, Debug)]
pub struct VaultConfig {
    /// Root directory of the storage tree.
    pub root_path: PathBuf,
    pub max_file_size_bytes: u64,
    pub compression_threshold_bytes: u64,
    pub compression_level: u32,
    pub thumbnail_max: (u32, u32),
    pub preview_max: (u32, u32),
    pub pdf_preview_dpi: u32,
    /// External renderer used for PDF previews (poppler's pdftoppm).
    pub pdftoppm_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Preferred frame-capture offset for video thumbnails, in seconds.
    /// Capped at 10% of the clip duration at capture time.
    pub video_frame_offset_secs: f64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("/var/lib/akiba/uploads"),
            max_file_size_bytes: constants::MAX_FILE_SIZE_BYTES,
            compression_threshold_bytes: constants::COMPRESSION_THRESHOLD_BYTES,
            compression_level: constants::DEFAULT_COMPRESSION_LEVEL,
            thumbnail_max: constants::THUMBNAIL_MAX,
            preview_max: constants::PREVIEW_MAX,
            pdf_preview_dpi: constants::PDF_PREVIEW_DPI,
            pdftoppm_path: "pdftoppm".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            video_frame_offset_secs: 1.0,
        }
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(v) => v
            .parse::<u64>()
            .with_context(|| format!("{name} must be an integer, got '{v}'")),
        Err(_) => Ok(default),
    }
}

fn env_u32(name: &str, default: u32) -> Result<u32> {
    Ok(env_u64(name, default as u64)? as u32)
}

impl VaultConfig {
    /// Build configuration from environment variables, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let root_path = env::var("AKIBA_STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.root_path);

        Ok(Self {
            root_path,
            max_file_size_bytes: env_u64("AKIBA_MAX_FILE_SIZE_BYTES", defaults.max_file_size_bytes)?,
            compression_threshold_bytes: env_u64(
                "AKIBA_COMPRESSION_THRESHOLD_BYTES",
                defaults.compression_threshold_bytes,
            )?,
            compression_level: env_u32("AKIBA_COMPRESSION_LEVEL", defaults.compression_level)?,
            thumbnail_max: defaults.thumbnail_max,
            preview_max: defaults.preview_max,
            pdf_preview_dpi: env_u32("AKIBA_PDF_PREVIEW_DPI", defaults.pdf_preview_dpi)?,
            pdftoppm_path: env::var("AKIBA_PDFTOPPM_PATH").unwrap_or(defaults.pdftoppm_path),
            ffmpeg_path: env::var("AKIBA_FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: env::var("AKIBA_FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            video_frame_offset_secs: defaults.video_frame_offset_secs,
        })
    }

    /// Clone of this config rooted at a different directory. Used by tests
    /// and by embedders that manage their own storage tree.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_path = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_spec_limits() {
        let config = VaultConfig::default();
        assert_eq!(config.max_file_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.compression_threshold_bytes, 5 * 1024 * 1024);
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.thumbnail_max, (300, 300));
        assert_eq!(config.preview_max, (800, 600));
        assert_eq!(config.pdf_preview_dpi, 150);
    }

    #[test]
    fn test_with_root() {
        let config = VaultConfig::default().with_root("/tmp/akiba-test");
        assert_eq!(config.root_path, PathBuf::from("/tmp/akiba-test"));
    }
}
