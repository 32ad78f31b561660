//! Image thumbnail pipeline.
//!
//! Flattens transparency onto white (JPEG has no alpha channel, and
//! rendering transparent pixels as black makes receipts unreadable),
//! shrinks to fit the bounding box with Lanczos resampling, and saves as
//! JPEG.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use akiba_core::constants::DERIVED_JPEG_QUALITY;
use akiba_storage::DocumentVault;

#[derive(Clone)]
pub struct ImagePipeline {
    vault: DocumentVault,
    max_box: (u32, u32),
}

/// Composite the image over a white background, dropping alpha.
pub(crate) fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |channel: u8| ((channel as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        flat.put_pixel(
            x,
            y,
            image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]),
        );
    }
    flat
}

/// Shrink to fit within `(max_width, max_height)` preserving aspect ratio.
/// Images already inside the box are left alone (no upscaling).
pub(crate) fn fit_within(img: RgbImage, max_box: (u32, u32)) -> RgbImage {
    let (width, height) = img.dimensions();
    let (max_width, max_height) = max_box;
    if width <= max_width && height <= max_height {
        return img;
    }
    DynamicImage::ImageRgb8(img)
        .resize(max_width, max_height, FilterType::Lanczos3)
        .to_rgb8()
}

pub(crate) fn save_jpeg(img: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    encoder
        .encode_image(img)
        .with_context(|| format!("Failed to encode JPEG {}", path.display()))?;
    Ok(())
}

impl ImagePipeline {
    pub fn new(vault: DocumentVault, max_box: (u32, u32)) -> Self {
        Self { vault, max_box }
    }

    /// Thumbnail for an image file, saved as
    /// `thumbnails/thumb_{sourceFilename}`.
    ///
    /// Never fails the caller: any decode or encode problem logs a warning
    /// and yields `None`.
    pub async fn generate_thumbnail(&self, source: &Path) -> Option<PathBuf> {
        match self.try_generate(source).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    path = %source.display(),
                    error = %e,
                    "Failed to generate image thumbnail"
                );
                None
            }
        }
    }

    async fn try_generate(&self, source: &Path) -> Result<PathBuf> {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .context("Source has no filename")?;
        let output = self.vault.thumbnail_path_for(filename);

        let source = source.to_path_buf();
        let out = output.clone();
        let max_box = self.max_box;
        let task_source = source.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let img = image::open(&task_source)
                .with_context(|| format!("Failed to decode {}", task_source.display()))?;
            let flat = flatten_onto_white(&img);
            let thumb = fit_within(flat, max_box);
            save_jpeg(&thumb, &out, DERIVED_JPEG_QUALITY)
        })
        .await
        .context("Thumbnail task panicked")??;

        tracing::debug!(
            source = %source.display(),
            thumbnail = %output.display(),
            "Generated image thumbnail"
        );
        Ok(output)
    }
}
