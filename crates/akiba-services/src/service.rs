//! The document service facade.
//!
//! One explicitly constructed object owning the vault, the registry seam,
//! and the ingestion pipeline. The web layer calls these methods; nothing
//! here is a global.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use akiba_core::config::VaultConfig;
use akiba_core::constants::mime_type_for_extension;
use akiba_core::error::AppError;
use akiba_core::models::{
    CascadeStats, CompressionOutcome, DocumentRecord, EntityRef, FileCategory, PreviewArtifacts,
    StorageUsage, StoredFile,
};
use akiba_processing::compression::compress_file;
use akiba_storage::naming::file_extension;
use akiba_storage::DocumentVault;

use crate::cascade::CascadeManager;
use crate::pipeline::{IngestOptions, IngestionPipeline, StoredFileInfo, TempCopy};
use crate::registry::DocumentRegistry;

/// One file in a batch upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub original_filename: String,
    pub data: Vec<u8>,
}

/// A per-file failure inside a batch. The batch itself carries on.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub filename: String,
    pub message: String,
}

/// Mixed result of a batch upload. The batch counts as successful when at
/// least one file made it.
#[derive(Debug, Default)]
pub struct BatchUploadOutcome {
    pub uploaded: Vec<DocumentRecord>,
    pub errors: Vec<BatchError>,
}

impl BatchUploadOutcome {
    pub fn succeeded(&self) -> bool {
        !self.uploaded.is_empty()
    }
}

pub struct DocumentService {
    vault: DocumentVault,
    registry: Arc<dyn DocumentRegistry>,
    pipeline: IngestionPipeline,
    cascade: CascadeManager,
    compression_level: u32,
}

impl DocumentService {
    /// Construct the service, creating the storage tree and probing the
    /// optional preview tools.
    pub async fn new(
        config: VaultConfig,
        registry: Arc<dyn DocumentRegistry>,
    ) -> Result<Self, AppError> {
        let vault = DocumentVault::new(&config.root_path)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        let compression_level = config.compression_level;
        let pipeline = IngestionPipeline::new(vault.clone(), config).await;
        let cascade = CascadeManager::new(vault.clone(), registry.clone());

        Ok(Self {
            vault,
            registry,
            pipeline,
            cascade,
            compression_level,
        })
    }

    pub fn vault(&self) -> &DocumentVault {
        &self.vault
    }

    fn record_from(entity: EntityRef, info: StoredFileInfo, actor: i64) -> DocumentRecord {
        // MIME and category describe the upload, not the on-disk (possibly
        // gzipped) representation.
        let logical_ext = file_extension(&info.original_filename);
        let stored = StoredFile {
            original_filename: info.original_filename,
            stored_filename: info.stored_filename,
            file_path: info.file_path,
            byte_size: info.file_size,
            mime_type: mime_type_for_extension(&logical_ext).to_string(),
            category: FileCategory::from_extension(&logical_ext),
            content_hash: info.metadata.sha256,
        };
        let compression = CompressionOutcome {
            is_compressed: info.is_compressed,
            original_size: info.file_size,
            final_size: info.compressed_size,
        };
        let previews = PreviewArtifacts {
            thumbnail_path: info.thumbnail_path,
            preview_path: info.preview_path,
        };
        DocumentRecord::new(entity, stored, compression, previews, actor)
    }

    /// Upload one file and record it.
    pub async fn upload(
        &self,
        entity: EntityRef,
        original_filename: &str,
        data: &[u8],
        options: IngestOptions,
        actor: i64,
    ) -> Result<DocumentRecord, AppError> {
        let info = self
            .pipeline
            .ingest(data, original_filename, entity, options)
            .await?;
        let record = Self::record_from(entity, info, actor);

        if let Err(e) = self.registry.insert_batch(vec![record.clone()]).await {
            let _ = self.vault.delete_file(&record.stored.file_path, true).await;
            return Err(AppError::Storage(format!("Failed to record upload: {e}")));
        }

        Ok(record)
    }

    /// Upload several files for one entity.
    ///
    /// Each file is validated and ingested independently; failures land in
    /// the error list and the loop continues. The registry commit happens
    /// once for the successful subset. If that commit fails, the files just
    /// written are unlinked best-effort before the error propagates.
    pub async fn upload_batch(
        &self,
        entity: EntityRef,
        files: Vec<UploadRequest>,
        options: IngestOptions,
        actor: i64,
    ) -> Result<BatchUploadOutcome, AppError> {
        let mut staged: Vec<DocumentRecord> = Vec::new();
        let mut errors: Vec<BatchError> = Vec::new();

        for file in files {
            match self
                .pipeline
                .ingest(&file.data, &file.original_filename, entity, options)
                .await
            {
                Ok(info) => staged.push(Self::record_from(entity, info, actor)),
                Err(e) => errors.push(BatchError {
                    filename: file.original_filename,
                    message: e.to_string(),
                }),
            }
        }

        if staged.is_empty() {
            return Ok(BatchUploadOutcome {
                uploaded: Vec::new(),
                errors,
            });
        }

        match self.registry.insert_batch(staged.clone()).await {
            Ok(()) => {
                tracing::info!(
                    entity = %entity,
                    uploaded = staged.len(),
                    failed = errors.len(),
                    "Batch upload committed"
                );
                Ok(BatchUploadOutcome {
                    uploaded: staged,
                    errors,
                })
            }
            Err(e) => {
                // Compensation: don't leave unrecorded files on disk.
                for record in &staged {
                    let _ = self.vault.delete_file(&record.stored.file_path, true).await;
                }
                Err(AppError::Storage(format!("Failed to commit batch: {e}")))
            }
        }
    }

    /// Fetch by id; soft-deleted records are still resolvable here.
    pub async fn get_document(&self, id: Uuid) -> Result<DocumentRecord, AppError> {
        Ok(self.registry.get(id).await?)
    }

    /// Active documents for an entity, newest first.
    pub async fn list_documents(&self, entity: EntityRef) -> Result<Vec<DocumentRecord>, AppError> {
        Ok(self.registry.list_for_entity(entity).await?)
    }

    /// A readable path for a document's content, decompressing to scratch
    /// space when the stored file is gzipped. The scratch copy lives as
    /// long as the returned guard.
    pub async fn document_content(
        &self,
        id: Uuid,
    ) -> Result<(PathBuf, Option<TempCopy>), AppError> {
        let record = self.registry.get(id).await?;
        self.pipeline
            .readable_copy(&record.stored.file_path, &record.stored.stored_filename)
            .await
    }

    /// Soft-delete: flips the lifecycle flag, leaves the filesystem alone.
    pub async fn soft_delete_document(
        &self,
        id: Uuid,
        actor: i64,
    ) -> Result<DocumentRecord, AppError> {
        let record = self.registry.soft_delete(id, actor).await?;
        tracing::info!(document_id = %id, actor, "Document soft-deleted");
        Ok(record)
    }

    /// Permanently delete a document: files first (main + derived), then
    /// the record.
    pub async fn permanent_delete_document(&self, id: Uuid) -> Result<(), AppError> {
        let record = self.registry.get(id).await?;

        self.vault
            .delete_file(&record.stored.file_path, true)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.registry.remove(id).await?;
        tracing::info!(document_id = %id, "Document permanently deleted");
        Ok(())
    }

    /// Manually compress an already stored document.
    ///
    /// Rejects soft-deleted and already compressed documents. Returns the
    /// record unchanged when the engine declined (pre-compressed format or
    /// insufficient gain).
    pub async fn compress_document(&self, id: Uuid) -> Result<DocumentRecord, AppError> {
        let mut record = self.registry.get(id).await?;
        if record.is_deleted() {
            return Err(AppError::Validation(format!(
                "Document has been deleted: {id}"
            )));
        }
        if record.compression.is_compressed {
            return Err(AppError::Validation(format!(
                "Document is already compressed: {id}"
            )));
        }

        let result = compress_file(&record.stored.file_path, self.compression_level)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        if !result.is_compressed {
            return Ok(record);
        }

        record.stored.file_path = result.final_path;
        record.compression = CompressionOutcome {
            is_compressed: true,
            original_size: result.original_size,
            final_size: result.final_size,
        };
        self.registry.update(record.clone()).await?;

        tracing::info!(
            document_id = %id,
            original_size = result.original_size,
            compressed_size = result.final_size,
            "Document compressed on demand"
        );
        Ok(record)
    }

    /// Cascade-delete everything under an entity (its documents and its
    /// descendants' documents).
    pub async fn cascade_delete_entity(
        &self,
        entity: EntityRef,
        actor: i64,
    ) -> Result<CascadeStats, AppError> {
        self.cascade.cascade_delete(entity, actor).await
    }

    /// Record a parent→child relationship for cascade purposes.
    pub async fn link_child_entity(
        &self,
        parent: EntityRef,
        child: EntityRef,
    ) -> Result<(), AppError> {
        Ok(self.registry.link_child(parent, child).await?)
    }

    /// Storage usage: for one entity, or across the whole tree.
    pub async fn storage_usage(
        &self,
        entity: Option<EntityRef>,
    ) -> Result<StorageUsage, AppError> {
        let usage = match entity {
            Some(entity) => self.vault.entity_usage(entity).await,
            None => self.vault.total_usage().await,
        };
        usage.map_err(|e| AppError::Storage(e.to_string()))
    }
}
