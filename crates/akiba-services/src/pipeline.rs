//! Ingestion pipeline: validate → name → save → compress → preview →
//! metadata.
//!
//! Stages run strictly in sequence; compression must finish before preview
//! generation can read the final bytes. Preview generation works on a
//! scratch decompressed copy when the file was compressed, and the scratch
//! copy is removed on every exit path via a drop guard.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use akiba_core::config::VaultConfig;
use akiba_core::error::AppError;
use akiba_core::models::EntityRef;
use akiba_processing::compression::{compress_file, decompress_file};
use akiba_processing::metadata::{extract_metadata, FileMetadata};
use akiba_processing::preview::PreviewGenerator;
use akiba_processing::validator::{UploadValidator, ValidationError};
use akiba_storage::naming::{file_extension, sanitize_filename, unique_stored_name};
use akiba_storage::{DocumentVault, VaultError};

/// Per-file ingestion switches, both on by default.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub auto_compress: bool,
    pub generate_preview: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            auto_compress: true,
            generate_preview: true,
        }
    }
}

/// Everything the caller needs to persist a document record.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFileInfo {
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: PathBuf,
    /// Size of the uploaded bytes, before compression.
    pub file_size: u64,
    /// Size on disk; equals `file_size` when not compressed.
    pub compressed_size: u64,
    pub is_compressed: bool,
    pub compression_ratio: f64,
    pub thumbnail_path: Option<PathBuf>,
    pub preview_path: Option<PathBuf>,
    pub metadata: FileMetadata,
}

impl StoredFileInfo {
    pub fn has_preview(&self) -> bool {
        self.thumbnail_path.is_some() || self.preview_path.is_some()
    }
}

/// Owned scratch file, removed when dropped. Used for decompressed working
/// copies so cleanup happens on success, failure, and unwind alike.
#[derive(Debug)]
pub struct TempCopy {
    path: PathBuf,
}

impl TempCopy {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempCopy {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch copy");
            }
        }
    }
}

fn map_validation(err: ValidationError) -> AppError {
    match err {
        ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
        other => AppError::Validation(other.to_string()),
    }
}

fn map_vault(err: VaultError) -> AppError {
    match err {
        VaultError::Io(io) => AppError::Io(io),
        other => AppError::Storage(other.to_string()),
    }
}

/// The ingestion pipeline. Construction probes the optional preview
/// capabilities once; the pipeline itself is cheap to clone.
#[derive(Clone)]
pub struct IngestionPipeline {
    vault: DocumentVault,
    previews: PreviewGenerator,
    config: VaultConfig,
}

impl IngestionPipeline {
    pub async fn new(vault: DocumentVault, config: VaultConfig) -> Self {
        let previews = PreviewGenerator::new(vault.clone(), &config).await;
        Self {
            vault,
            previews,
            config,
        }
    }

    pub fn vault(&self) -> &DocumentVault {
        &self.vault
    }

    /// Ingest one file for an entity.
    ///
    /// Validation failures reject before any disk write; an I/O failure
    /// during the write aborts the ingestion with nothing left behind.
    /// Preview failures never abort: they degrade to a file without
    /// previews.
    pub async fn ingest(
        &self,
        data: &[u8],
        original_filename: &str,
        entity: EntityRef,
        options: IngestOptions,
    ) -> Result<StoredFileInfo, AppError> {
        let validator = UploadValidator::new(self.config.max_file_size_bytes);
        validator
            .validate(original_filename, data.len() as u64)
            .map_err(map_validation)?;

        let safe_original = sanitize_filename(original_filename);
        let stored_filename = unique_stored_name(&safe_original);
        let path = self
            .vault
            .resolve(entity, &stored_filename)
            .await
            .map_err(map_vault)?;

        if let Err(e) = self.vault.write_bytes(&path, data).await {
            // Never leave a partial file behind on a failed write.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(map_vault(e));
        }

        let file_size = data.len() as u64;

        let compression = if options.auto_compress
            && file_size > self.config.compression_threshold_bytes
        {
            compress_file(&path, self.config.compression_level)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?
        } else {
            akiba_processing::compression::CompressionResult {
                final_path: path.clone(),
                original_size: file_size,
                final_size: file_size,
                is_compressed: false,
            }
        };

        let (thumbnail_path, preview_path) = if options.generate_preview {
            self.generate_previews(&compression.final_path, &stored_filename, compression.is_compressed)
                .await
        } else {
            (None, None)
        };

        let metadata = extract_metadata(&compression.final_path)
            .await
            .map_err(AppError::from)?;

        let compression_ratio = if compression.is_compressed {
            (1.0 - compression.final_size as f64 / compression.original_size as f64) * 100.0
        } else {
            0.0
        };

        let info = StoredFileInfo {
            original_filename: safe_original,
            stored_filename,
            file_path: compression.final_path,
            file_size,
            compressed_size: compression.final_size,
            is_compressed: compression.is_compressed,
            compression_ratio,
            thumbnail_path,
            preview_path,
            metadata,
        };

        tracing::info!(
            entity = %entity,
            stored = %info.stored_filename,
            size_bytes = info.file_size,
            compressed = info.is_compressed,
            has_preview = info.has_preview(),
            "File ingested"
        );

        Ok(info)
    }

    /// Run the matching preview pipeline, decompressing to a scratch copy
    /// first when needed. Never fails the ingestion.
    async fn generate_previews(
        &self,
        final_path: &Path,
        stored_filename: &str,
        is_compressed: bool,
    ) -> (Option<PathBuf>, Option<PathBuf>) {
        let extension = file_extension(stored_filename);

        let scratch: Option<TempCopy> = if is_compressed {
            let scratch_path = self.vault.temp_path_for(stored_filename);
            match decompress_file(final_path, Some(&scratch_path)).await {
                Ok(path) => Some(TempCopy::new(path)),
                Err(e) => {
                    tracing::warn!(
                        path = %final_path.display(),
                        error = %e,
                        "Failed to decompress for preview generation, skipping previews"
                    );
                    return (None, None);
                }
            }
        } else {
            None
        };

        let readable = scratch
            .as_ref()
            .map(TempCopy::path)
            .unwrap_or(final_path);

        let artifacts = self.previews.generate(readable, &extension).await;
        // `scratch` drops here, removing the temp copy whatever happened.
        (artifacts.thumbnail_path, artifacts.preview_path)
    }

    /// A readable copy of a stored file: the file itself, or a scratch
    /// decompression under `temp/` that lives as long as the returned guard.
    pub async fn readable_copy(
        &self,
        file_path: &Path,
        stored_filename: &str,
    ) -> Result<(PathBuf, Option<TempCopy>), AppError> {
        if !file_path
            .to_string_lossy()
            .ends_with(akiba_processing::compression::COMPRESSED_SUFFIX)
        {
            return Ok((file_path.to_path_buf(), None));
        }

        let scratch_name = format!("{}_{}", Uuid::new_v4().simple(), stored_filename);
        let scratch_path = self.vault.temp_path_for(&scratch_name);
        let path = decompress_file(file_path, Some(&scratch_path))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok((path.clone(), Some(TempCopy::new(path))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use akiba_core::models::EntityType;
    use tempfile::tempdir;

    async fn pipeline(root: &Path) -> IngestionPipeline {
        let vault = DocumentVault::new(root).await.unwrap();
        // Nonexistent tool paths keep the optional pipelines deterministic.
        let config = VaultConfig {
            pdftoppm_path: "/nonexistent/pdftoppm".to_string(),
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..VaultConfig::default()
        }
        .with_root(root);
        IngestionPipeline::new(vault, config).await
    }

    #[tokio::test]
    async fn test_ingest_small_text_file() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;
        let entity = EntityRef::new(EntityType::Meeting, 5);

        let info = pipeline
            .ingest(b"minutes of the meeting", "Minutes.TXT", entity, IngestOptions::default())
            .await
            .unwrap();

        assert!(info.stored_filename.ends_with(".txt"));
        assert_eq!(info.file_size, 22);
        assert!(!info.is_compressed);
        assert_eq!(info.compressed_size, info.file_size);
        assert_eq!(info.compression_ratio, 0.0);
        assert!(info.file_path.exists());
        assert_eq!(info.metadata.mime_type, "text/plain");
    }

    #[tokio::test]
    async fn test_ingest_rejects_disallowed_extension_before_write() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;
        let entity = EntityRef::new(EntityType::Member, 1);

        let result = pipeline
            .ingest(b"MZ", "app.exe", entity, IngestOptions::default())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Nothing written for the rejected file.
        assert!(!pipeline.vault().entity_dir_path(entity).exists());
    }

    #[tokio::test]
    async fn test_ingest_rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let vault = DocumentVault::new(dir.path()).await.unwrap();
        let config = VaultConfig {
            max_file_size_bytes: 1024,
            ..VaultConfig::default().with_root(dir.path())
        };
        let pipeline = IngestionPipeline::new(vault, config).await;

        let result = pipeline
            .ingest(
                &vec![0u8; 2048],
                "big.txt",
                EntityRef::new(EntityType::Group, 1),
                IngestOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn test_ingest_compresses_large_compressible_file() {
        let dir = tempdir().unwrap();
        let vault = DocumentVault::new(dir.path()).await.unwrap();
        let config = VaultConfig {
            compression_threshold_bytes: 1024,
            pdftoppm_path: "/nonexistent/pdftoppm".to_string(),
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..VaultConfig::default()
        }
        .with_root(dir.path());
        let pipeline = IngestionPipeline::new(vault, config).await;

        let content = vec![b'x'; 16 * 1024];
        let info = pipeline
            .ingest(
                &content,
                "ledger.csv",
                EntityRef::new(EntityType::Savings, 2),
                IngestOptions::default(),
            )
            .await
            .unwrap();

        assert!(info.is_compressed);
        assert!(info.file_path.to_string_lossy().ends_with(".csv.gz"));
        assert!(info.compressed_size < info.file_size);
        assert!(info.compression_ratio >= 10.0);
        assert!(info.metadata.is_compressed);

        // The temp scratch used for preview generation is gone.
        let mut temp_entries = tokio::fs::read_dir(pipeline.vault().temp_dir()).await.unwrap();
        assert!(temp_entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_below_threshold_is_not_compressed() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;

        let content = vec![b'x'; 4 * 1024]; // well under the 5 MB default
        let info = pipeline
            .ingest(
                &content,
                "small.txt",
                EntityRef::new(EntityType::Fine, 3),
                IngestOptions::default(),
            )
            .await
            .unwrap();

        assert!(!info.is_compressed);
        let on_disk = tokio::fs::read(&info.file_path).await.unwrap();
        assert_eq!(on_disk, content);
    }

    #[tokio::test]
    async fn test_ingest_generates_image_thumbnail() {
        use image::{ImageFormat, Rgb, RgbImage};
        use std::io::Cursor;

        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;

        let img = RgbImage::from_pixel(640, 480, Rgb([200, 50, 50]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let info = pipeline
            .ingest(
                &bytes,
                "receipt.png",
                EntityRef::new(EntityType::LoanRepayment, 8),
                IngestOptions::default(),
            )
            .await
            .unwrap();

        assert!(info.has_preview());
        let thumb = info.thumbnail_path.unwrap();
        let (w, h) = image::image_dimensions(&thumb).unwrap();
        assert!(w <= 300 && h <= 300);
        assert_eq!(info.preview_path, None);
        assert_eq!(info.metadata.image_width, Some(640));
    }

    #[tokio::test]
    async fn test_ingest_corrupt_pdf_without_renderer_still_succeeds() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;

        let info = pipeline
            .ingest(
                b"%PDF-1.4 truncated garbage",
                "broken.pdf",
                EntityRef::new(EntityType::Training, 4),
                IngestOptions::default(),
            )
            .await
            .unwrap();

        assert!(!info.has_preview());
        assert!(info.file_path.exists());
    }

    #[tokio::test]
    async fn test_ingest_preview_disabled() {
        use image::{ImageFormat, Rgb, RgbImage};
        use std::io::Cursor;

        let dir = tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;

        let img = RgbImage::from_pixel(100, 100, Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let info = pipeline
            .ingest(
                &bytes,
                "photo.png",
                EntityRef::new(EntityType::Voting, 6),
                IngestOptions {
                    generate_preview: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!info.has_preview());
    }

    #[tokio::test]
    async fn test_temp_copy_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scratch.txt");
        tokio::fs::write(&path, b"scratch").await.unwrap();

        {
            let _guard = TempCopy::new(path.clone());
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_readable_copy_of_compressed_file() {
        let dir = tempdir().unwrap();
        let vault = DocumentVault::new(dir.path()).await.unwrap();
        let config = VaultConfig {
            compression_threshold_bytes: 512,
            pdftoppm_path: "/nonexistent/pdftoppm".to_string(),
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..VaultConfig::default()
        }
        .with_root(dir.path());
        let pipeline = IngestionPipeline::new(vault, config).await;

        let content = b"row,amount\n".repeat(500);
        let info = pipeline
            .ingest(
                &content,
                "book.csv",
                EntityRef::new(EntityType::Group, 9),
                IngestOptions::default(),
            )
            .await
            .unwrap();
        assert!(info.is_compressed);

        let (readable, guard) = pipeline
            .readable_copy(&info.file_path, &info.stored_filename)
            .await
            .unwrap();
        assert!(guard.is_some());
        assert_eq!(tokio::fs::read(&readable).await.unwrap(), content);

        drop(guard);
        assert!(!readable.exists());
    }
}
