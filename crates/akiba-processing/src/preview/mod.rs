//! Preview generation.
//!
//! Three independent pipelines selected by file type. Every pipeline
//! returns `Option<PathBuf>` and never propagates an error: a missing
//! preview is a degraded-but-valid state, never a fatal one. The PDF and
//! video pipelines depend on external tools and check their availability
//! once at construction; when a tool is absent they skip with a warning.

pub mod image;
pub mod pdf;
pub mod video;

use std::path::Path;

use akiba_core::config::VaultConfig;
use akiba_core::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use akiba_core::models::PreviewArtifacts;
use akiba_storage::DocumentVault;

pub use image::ImagePipeline;
pub use pdf::PdfRenderer;
pub use video::VideoThumbnailer;

/// Dispatches a stored file to the pipeline matching its media type.
#[derive(Clone)]
pub struct PreviewGenerator {
    image: ImagePipeline,
    pdf: PdfRenderer,
    video: VideoThumbnailer,
}

impl PreviewGenerator {
    /// Build all pipelines, probing the external PDF and video tools.
    pub async fn new(vault: DocumentVault, config: &VaultConfig) -> Self {
        let image = ImagePipeline::new(vault.clone(), config.thumbnail_max);
        let pdf = PdfRenderer::detect(
            vault.clone(),
            &config.pdftoppm_path,
            config.pdf_preview_dpi,
            config.preview_max,
        )
        .await;
        let video = VideoThumbnailer::detect(
            vault,
            &config.ffmpeg_path,
            &config.ffprobe_path,
            config.video_frame_offset_secs,
            image.clone(),
        )
        .await;

        Self { image, pdf, video }
    }

    /// Generate whatever derived images the file type supports.
    ///
    /// `extension` is the *original* upload's extension; `path` points at a
    /// readable (decompressed) copy of the content.
    pub async fn generate(&self, path: &Path, extension: &str) -> PreviewArtifacts {
        let ext = extension.to_lowercase();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            if ext == "svg" {
                tracing::debug!(path = %path.display(), "Skipping preview for vector image");
                return PreviewArtifacts::none();
            }
            return PreviewArtifacts {
                thumbnail_path: self.image.generate_thumbnail(path).await,
                preview_path: None,
            };
        }

        if ext == "pdf" {
            let preview_path = self.pdf.generate_preview(path, 0).await;
            // The thumbnail is derived from the rendered preview, not the PDF.
            let thumbnail_path = match &preview_path {
                Some(preview) => self.image.generate_thumbnail(preview).await,
                None => None,
            };
            return PreviewArtifacts {
                thumbnail_path,
                preview_path,
            };
        }

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return PreviewArtifacts {
                thumbnail_path: self.video.generate_thumbnail(path).await,
                preview_path: None,
            };
        }

        PreviewArtifacts::none()
    }
}
