//! Cascading deletion across the entity hierarchy.
//!
//! Deleting a group cascades to its meetings, their activities, and every
//! document underneath. Filesystem deletion and the database soft-delete
//! flags happen in the same operation per level, so the two views do not
//! diverge.

use std::sync::Arc;

use akiba_core::error::AppError;
use akiba_core::models::{CascadeStats, EntityRef};
use akiba_storage::DocumentVault;

use crate::registry::DocumentRegistry;

pub struct CascadeManager {
    vault: DocumentVault,
    registry: Arc<dyn DocumentRegistry>,
}

impl CascadeManager {
    pub fn new(vault: DocumentVault, registry: Arc<dyn DocumentRegistry>) -> Self {
        Self { vault, registry }
    }

    /// Hard-delete every file under `entity` and its descendants,
    /// soft-deleting the matching document records level by level.
    ///
    /// A file that cannot be unlinked is counted in `failed_count` and the
    /// cascade continues.
    pub async fn cascade_delete(
        &self,
        entity: EntityRef,
        actor: i64,
    ) -> Result<CascadeStats, AppError> {
        let mut stats = CascadeStats::default();

        let children = self
            .registry
            .children_of(entity)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        for child in children {
            let child_stats = Box::pin(self.cascade_delete(child, actor)).await?;
            stats.absorb(child_stats);
        }

        let own = self
            .vault
            .delete_entity_files(entity)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        stats.absorb(own);

        let flagged = self
            .registry
            .soft_delete_for_entity(entity, actor)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::info!(
            entity = %entity,
            deleted = stats.deleted_count,
            failed = stats.failed_count,
            bytes_freed = stats.bytes_freed,
            records_flagged = flagged,
            "Cascade delete completed for entity"
        );

        Ok(stats)
    }
}
