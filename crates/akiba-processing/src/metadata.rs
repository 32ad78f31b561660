//! File metadata extraction.
//!
//! The content hash is streamed in fixed-size chunks; type-specific fields
//! (image dimensions, PDF page count) are best-effort and never fail the
//! extraction as a whole.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use akiba_core::constants::{mime_type_for_extension, HASH_CHUNK_SIZE};
use akiba_core::models::FileCategory;
use akiba_storage::naming::file_extension;

use crate::compression::COMPRESSED_SUFFIX;

/// Metadata of a file as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub extension: String,
    pub mime_type: String,
    pub category: FileCategory,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub is_compressed: bool,
    /// SHA-256 over the full byte stream, hex-encoded.
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_pages: Option<u32>,
}

/// SHA-256 of a file, read in fixed-size chunks.
pub async fn hash_file(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut file = File::open(&path)
            .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; HASH_CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .context("Hashing task panicked")?
}

/// Best-effort MIME type: content sniffing when it recognizes the bytes,
/// extension table otherwise.
fn sniff_mime_type(path: &Path, extension: &str) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        _ => mime_type_for_extension(extension).to_string(),
    }
}

/// Image dimensions from the file header, skipping vector formats.
fn image_dimensions(path: &Path, extension: &str) -> Option<(u32, u32)> {
    if extension == "svg" {
        return None;
    }
    image::ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Page count scraped from the first `/Count` entry of the page tree.
fn pdf_page_count(data: &[u8]) -> Option<u32> {
    let data_str = String::from_utf8_lossy(data);
    data_str.split("/Count").nth(1).and_then(|s| {
        let num_str = s
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>();
        num_str.parse::<u32>().ok()
    })
}

/// Extract metadata from a file on disk.
///
/// Filesystem facts and the content hash are required; the image/PDF fields
/// are populated only when extraction succeeds for them.
pub async fn extract_metadata(path: &Path) -> Result<FileMetadata> {
    let fs_meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_extension(&file_name);
    let category = FileCategory::from_extension(&extension);
    let is_compressed = file_name.ends_with(COMPRESSED_SUFFIX);

    let sha256 = hash_file(path).await?;

    let mut metadata = FileMetadata {
        file_name,
        file_size: fs_meta.len(),
        mime_type: sniff_mime_type(path, &extension),
        category,
        created_at: fs_meta.created().ok().map(DateTime::<Utc>::from),
        modified_at: fs_meta.modified().ok().map(DateTime::<Utc>::from),
        is_compressed,
        sha256,
        extension,
        image_width: None,
        image_height: None,
        pdf_pages: None,
    };

    if metadata.category == FileCategory::Images {
        if let Some((width, height)) = image_dimensions(path, &metadata.extension) {
            metadata.image_width = Some(width);
            metadata.image_height = Some(height);
        }
    }

    if metadata.extension == "pdf" {
        match tokio::fs::read(path).await {
            Ok(data) => metadata.pdf_pages = pdf_page_count(&data),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping PDF page count")
            }
        }
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_hash_is_deterministic_across_names() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("first.txt");
        let b = dir.path().join("second.txt");
        tokio::fs::write(&a, b"identical bytes").await.unwrap();
        tokio::fs::write(&b, b"identical bytes").await.unwrap();

        assert_eq!(hash_file(&a).await.unwrap(), hash_file(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_known_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        tokio::fs::write(&path, b"").await.unwrap();

        // SHA-256 of the empty string.
        assert_eq!(
            hash_file(&path).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_extract_metadata_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"meeting notes").await.unwrap();

        let meta = extract_metadata(&path).await.unwrap();
        assert_eq!(meta.file_name, "notes.txt");
        assert_eq!(meta.file_size, 13);
        assert_eq!(meta.extension, "txt");
        assert_eq!(meta.mime_type, "text/plain");
        assert_eq!(meta.category, FileCategory::Documents);
        assert!(!meta.is_compressed);
        assert_eq!(meta.image_width, None);
        assert_eq!(meta.pdf_pages, None);
    }

    #[tokio::test]
    async fn test_extract_metadata_image_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");

        let img = RgbImage::from_pixel(120, 80, Rgb([10, 20, 30]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        tokio::fs::write(&path, &buffer).await.unwrap();

        let meta = extract_metadata(&path).await.unwrap();
        assert_eq!(meta.category, FileCategory::Images);
        assert_eq!(meta.image_width, Some(120));
        assert_eq!(meta.image_height, Some(80));
        // Content sniffing recognizes the PNG regardless of extension table.
        assert_eq!(meta.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_extract_metadata_corrupt_image_still_returns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        tokio::fs::write(&path, b"definitely not a png").await.unwrap();

        let meta = extract_metadata(&path).await.unwrap();
        assert_eq!(meta.category, FileCategory::Images);
        assert_eq!(meta.image_width, None);
        assert_eq!(meta.image_height, None);
    }

    #[tokio::test]
    async fn test_extract_metadata_pdf_page_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        let pdf = b"%PDF-1.4\n1 0 obj\n<< /Type /Pages /Count 3 /Kids [] >>\nendobj\n%%EOF";
        tokio::fs::write(&path, pdf).await.unwrap();

        let meta = extract_metadata(&path).await.unwrap();
        assert_eq!(meta.pdf_pages, Some(3));
        assert_eq!(meta.category, FileCategory::Documents);
    }

    #[tokio::test]
    async fn test_extract_metadata_compressed_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ab12.txt.gz");
        tokio::fs::write(&path, b"pretend gzip").await.unwrap();

        let meta = extract_metadata(&path).await.unwrap();
        assert!(meta.is_compressed);
        assert_eq!(meta.extension, "gz");
    }

    #[test]
    fn test_pdf_page_count_parsing() {
        assert_eq!(pdf_page_count(b"<< /Count 12 >>"), Some(12));
        assert_eq!(pdf_page_count(b"no pages here"), None);
    }
}
