//! Storage accounting: live directory scans, grouped per entity or per
//! entity-type bucket.
//!
//! O(files) per call; this is a reporting operation, not a hot path.

use tokio::fs;

use akiba_core::models::{EntityRef, EntityType, FileCategory, StorageUsage};

use crate::naming::logical_extension;
use crate::vault::{DocumentVault, VaultResult};

impl DocumentVault {
    /// Usage for one entity's directory, grouped by file category.
    ///
    /// An entity that never stored anything reports zeroes.
    pub async fn entity_usage(&self, entity: EntityRef) -> VaultResult<StorageUsage> {
        let entity_dir = self.entity_dir_path(entity);
        let mut usage = StorageUsage::default();

        if !fs::try_exists(&entity_dir).await.unwrap_or(false) {
            return Ok(usage);
        }

        let mut entries = fs::read_dir(&entity_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let size = metadata.len();
            usage.total_files += 1;
            usage.total_bytes += size;

            let filename = entry.file_name();
            let category =
                FileCategory::from_extension(&logical_extension(&filename.to_string_lossy()));
            usage
                .by_category
                .entry(category.as_str().to_string())
                .or_default()
                .add(size);
        }

        Ok(usage)
    }

    /// Usage across the whole storage tree, grouped by entity-type bucket.
    pub async fn total_usage(&self) -> VaultResult<StorageUsage> {
        let mut usage = StorageUsage::default();

        for entity_type in EntityType::ALL {
            let bucket_dir = self.root().join(entity_type.dir_name());
            if !fs::try_exists(&bucket_dir).await.unwrap_or(false) {
                continue;
            }

            let mut entity_dirs = fs::read_dir(&bucket_dir).await?;
            while let Some(entity_entry) = entity_dirs.next_entry().await? {
                if !entity_entry
                    .metadata()
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false)
                {
                    continue;
                }

                let mut files = fs::read_dir(entity_entry.path()).await?;
                while let Some(file_entry) = files.next_entry().await? {
                    let metadata = match file_entry.metadata().await {
                        Ok(m) if m.is_file() => m,
                        _ => continue,
                    };
                    let size = metadata.len();
                    usage.total_files += 1;
                    usage.total_bytes += size;
                    usage
                        .by_entity_type
                        .entry(entity_type.dir_name())
                        .or_default()
                        .add(size);
                }
            }
        }

        Ok(usage)
    }
}
