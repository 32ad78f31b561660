//! Hard deletion: main file, derived artifacts, and whole entity
//! directories.
//!
//! Deleting a path that is already gone is success, which makes every
//! operation here idempotent and safe under concurrent deletes of the same
//! file.

use std::path::{Path, PathBuf};

use tokio::fs;

use akiba_core::models::{CascadeStats, EntityRef};

use crate::vault::{DocumentVault, VaultResult};

impl DocumentVault {
    /// Candidate paths for every derived artifact a stored file can have.
    ///
    /// The preview pipelines name their outputs from the *decompressed*
    /// filename, so candidates are derived from the logical name with any
    /// trailing `.gz` stripped: `thumb_{base}` (image thumbnails),
    /// `thumb_{stem}.jpg` (video thumbnails), `thumb_preview_{stem}.jpg`
    /// (thumbnails of PDF previews), `preview_{stem}.jpg` (PDF previews),
    /// plus a sibling `{path}.gz` when the main file is not itself the
    /// compressed variant.
    pub(crate) fn related_artifact_paths(&self, file_path: &Path) -> Vec<PathBuf> {
        let Some(filename) = file_path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };

        let base = filename.strip_suffix(".gz").unwrap_or(filename);
        let stem = match base.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => base,
        };

        let mut candidates = vec![
            self.thumbnail_path_for(base),
            self.thumbnail_path_for(&format!("preview_{stem}.jpg")),
            self.preview_path_for(stem),
        ];

        let video_thumb = self.thumbnail_path_for(&format!("{stem}.jpg"));
        if !candidates.contains(&video_thumb) {
            candidates.push(video_thumb);
        }

        if !filename.ends_with(".gz") {
            if let Some(parent) = file_path.parent() {
                candidates.push(parent.join(format!("{filename}.gz")));
            }
        }

        candidates
    }

    /// Unlink a stored file and, when `delete_related`, all of its derived
    /// artifacts.
    ///
    /// A missing main file is not an error. Failures removing related
    /// artifacts are logged and swallowed; only a failure unlinking an
    /// existing main file propagates.
    pub async fn delete_file(&self, file_path: &Path, delete_related: bool) -> VaultResult<()> {
        if fs::try_exists(file_path).await.unwrap_or(false) {
            fs::remove_file(file_path).await?;
            tracing::info!(path = %file_path.display(), "Deleted stored file");
        }

        if delete_related {
            for artifact in self.related_artifact_paths(file_path) {
                if !fs::try_exists(&artifact).await.unwrap_or(false) {
                    continue;
                }
                match fs::remove_file(&artifact).await {
                    Ok(()) => {
                        tracing::debug!(path = %artifact.display(), "Deleted derived artifact")
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %artifact.display(),
                            error = %e,
                            "Failed to delete derived artifact, continuing"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Hard-delete every file in an entity's directory, then remove the
    /// emptied directory.
    ///
    /// One file failing to unlink is counted and the loop continues.
    pub async fn delete_entity_files(&self, entity: EntityRef) -> VaultResult<CascadeStats> {
        let entity_dir = self.entity_dir_path(entity);
        let mut stats = CascadeStats::default();

        if !fs::try_exists(&entity_dir).await.unwrap_or(false) {
            return Ok(stats);
        }

        let mut entries = fs::read_dir(&entity_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let size = metadata.len();

            match self.delete_file(&path, true).await {
                Ok(()) => {
                    stats.deleted_count += 1;
                    stats.bytes_freed += size;
                }
                Err(e) => {
                    stats.failed_count += 1;
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to delete entity file, continuing cascade"
                    );
                }
            }
        }

        // Only removes the directory when the loop emptied it.
        if fs::remove_dir(&entity_dir).await.is_ok() {
            tracing::debug!(path = %entity_dir.display(), "Removed empty entity directory");
        }

        tracing::info!(
            entity = %entity,
            deleted = stats.deleted_count,
            failed = stats.failed_count,
            bytes_freed = stats.bytes_freed,
            "Entity file cascade completed"
        );

        Ok(stats)
    }
}
