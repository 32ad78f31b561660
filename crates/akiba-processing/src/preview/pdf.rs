//! PDF preview pipeline.
//!
//! Rasterizes one page with poppler's `pdftoppm` and shrinks the result to
//! the preview bounding box. The renderer is an optional external tool:
//! availability is probed once at construction, and an absent tool means
//! previews are skipped with a warning, never an error.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use tokio::process::Command;

use akiba_core::constants::DERIVED_JPEG_QUALITY;
use akiba_storage::DocumentVault;

use super::image::{fit_within, save_jpeg};

#[derive(Clone)]
pub struct PdfRenderer {
    vault: DocumentVault,
    pdftoppm_path: String,
    dpi: u32,
    preview_box: (u32, u32),
    available: bool,
}

impl PdfRenderer {
    /// Probe `pdftoppm` and build the renderer. The probe only checks that
    /// the binary can be executed; rendering failures are handled per file.
    pub async fn detect(
        vault: DocumentVault,
        pdftoppm_path: &str,
        dpi: u32,
        preview_box: (u32, u32),
    ) -> Self {
        let available = Command::new(pdftoppm_path)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok();

        if !available {
            tracing::warn!(
                pdftoppm = %pdftoppm_path,
                "pdftoppm not available, PDF previews will be skipped"
            );
        }

        Self {
            vault,
            pdftoppm_path: pdftoppm_path.to_string(),
            dpi,
            preview_box,
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Render `page_number` (0-based) of a PDF to
    /// `previews/preview_{stem}.jpg`.
    ///
    /// Returns `None` when the renderer is unavailable or the render fails;
    /// both are logged, neither propagates.
    pub async fn generate_preview(&self, source: &Path, page_number: u32) -> Option<PathBuf> {
        if !self.available {
            tracing::warn!(
                path = %source.display(),
                "Skipping PDF preview, renderer unavailable"
            );
            return None;
        }

        match self.try_generate(source, page_number).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    path = %source.display(),
                    error = %e,
                    "Failed to generate PDF preview"
                );
                None
            }
        }
    }

    async fn try_generate(&self, source: &Path, page_number: u32) -> Result<PathBuf> {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .context("Source has no filename")?;
        let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);

        // pdftoppm appends its own extension to the prefix.
        let render_prefix = self.vault.temp_path_for(&format!("{stem}_page"));
        let rendered = render_prefix.with_extension("jpg");

        let page = (page_number + 1).to_string();
        let output = Command::new(&self.pdftoppm_path)
            .args(["-jpeg", "-singlefile", "-r"])
            .arg(self.dpi.to_string())
            .args(["-f", &page, "-l", &page])
            .arg(source)
            .arg(&render_prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute pdftoppm")?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&rendered).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("pdftoppm failed: {}", stderr.trim()));
        }

        let preview_path = self.vault.preview_path_for(stem);
        let resize_result = {
            let rendered = rendered.clone();
            let preview_path = preview_path.clone();
            let preview_box = self.preview_box;
            tokio::task::spawn_blocking(move || -> Result<()> {
                let img = image::open(&rendered)
                    .with_context(|| format!("Failed to decode {}", rendered.display()))?;
                let fitted = fit_within(img.to_rgb8(), preview_box);
                save_jpeg(&fitted, &preview_path, DERIVED_JPEG_QUALITY)
            })
            .await
            .context("Preview resize task panicked")?
        };

        // The rendered page is scratch either way.
        let _ = tokio::fs::remove_file(&rendered).await;
        resize_result?;

        tracing::info!(
            source = %source.display(),
            preview = %preview_path.display(),
            "Generated PDF preview"
        );
        Ok(preview_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn renderer(root: &Path, pdftoppm: &str) -> PdfRenderer {
        let vault = DocumentVault::new(root).await.unwrap();
        PdfRenderer::detect(vault, pdftoppm, 150, (800, 600)).await
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let dir = tempdir().unwrap();
        let renderer = renderer(dir.path(), "/nonexistent/pdftoppm").await;
        assert!(!renderer.is_available());
    }

    #[tokio::test]
    async fn test_unavailable_renderer_returns_none() {
        let dir = tempdir().unwrap();
        let renderer = renderer(dir.path(), "/nonexistent/pdftoppm").await;

        let pdf = dir.path().join("doc.pdf");
        tokio::fs::write(&pdf, b"%PDF-1.4").await.unwrap();

        assert!(renderer.generate_preview(&pdf, 0).await.is_none());
    }

    #[tokio::test]
    async fn test_render_failure_returns_none() {
        // Use a binary that exists but is not a PDF renderer; the probe
        // passes, the render itself fails, and the failure is contained.
        let dir = tempdir().unwrap();
        let renderer = renderer(dir.path(), "true").await;
        assert!(renderer.is_available());

        let pdf = dir.path().join("doc.pdf");
        tokio::fs::write(&pdf, b"%PDF-1.4 corrupt").await.unwrap();

        // `true` exits 0 but renders nothing, so decoding the missing
        // output fails and the pipeline degrades to None.
        assert!(renderer.generate_preview(&pdf, 0).await.is_none());
    }
}
