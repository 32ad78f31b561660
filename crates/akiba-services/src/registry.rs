//! The document registry seam.
//!
//! The relational store behind document records is an external collaborator;
//! this trait is the boundary the service talks to. The in-memory
//! implementation backs tests and embedded use. Parent→child entity links
//! (group → meeting → activity) live here too, since the cascade manager
//! needs them to walk the hierarchy.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use akiba_core::models::{DocumentLifecycle, DocumentRecord, EntityRef};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("Document already deleted: {0}")]
    AlreadyDeleted(Uuid),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl From<RegistryError> for akiba_core::error::AppError {
    fn from(err: RegistryError) -> Self {
        use akiba_core::error::AppError;
        match err {
            RegistryError::NotFound(id) => AppError::NotFound(format!("Document not found: {id}")),
            RegistryError::AlreadyDeleted(id) => {
                AppError::Validation(format!("Document already deleted: {id}"))
            }
            RegistryError::Unavailable(msg) => AppError::Storage(msg),
        }
    }
}

/// Persistence boundary for document records and the entity hierarchy.
#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    /// Commit a batch of records in one operation. Either every record is
    /// stored or none are.
    async fn insert_batch(&self, records: Vec<DocumentRecord>) -> RegistryResult<()>;

    /// Fetch by id. Soft-deleted records are still resolvable.
    async fn get(&self, id: Uuid) -> RegistryResult<DocumentRecord>;

    /// Active documents for an entity, newest first. Soft-deleted records
    /// are excluded.
    async fn list_for_entity(&self, entity: EntityRef) -> RegistryResult<Vec<DocumentRecord>>;

    /// Replace an existing record (same id).
    async fn update(&self, record: DocumentRecord) -> RegistryResult<()>;

    /// Mark one document soft-deleted. Double deletion is an error.
    async fn soft_delete(&self, id: Uuid, actor: i64) -> RegistryResult<DocumentRecord>;

    /// Mark every active document of an entity soft-deleted; returns how
    /// many were flagged.
    async fn soft_delete_for_entity(&self, entity: EntityRef, actor: i64) -> RegistryResult<u64>;

    /// Remove a record entirely (hard delete).
    async fn remove(&self, id: Uuid) -> RegistryResult<DocumentRecord>;

    /// Record that `child` belongs to `parent` in the entity hierarchy.
    async fn link_child(&self, parent: EntityRef, child: EntityRef) -> RegistryResult<()>;

    /// Direct children of an entity.
    async fn children_of(&self, parent: EntityRef) -> RegistryResult<Vec<EntityRef>>;
}

#[derive(Default)]
struct Inner {
    documents: HashMap<Uuid, DocumentRecord>,
    children: HashMap<EntityRef, Vec<EntityRef>>,
}

/// In-memory registry.
#[derive(Default)]
pub struct InMemoryDocumentRegistry {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRegistry for InMemoryDocumentRegistry {
    async fn insert_batch(&self, records: Vec<DocumentRecord>) -> RegistryResult<()> {
        let mut inner = self.inner.write().await;
        for record in records {
            inner.documents.insert(record.id, record);
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RegistryResult<DocumentRecord> {
        let inner = self.inner.read().await;
        inner
            .documents
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    async fn list_for_entity(&self, entity: EntityRef) -> RegistryResult<Vec<DocumentRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<DocumentRecord> = inner
            .documents
            .values()
            .filter(|r| r.owner == entity && !r.is_deleted())
            .cloned()
            .collect();
        records.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(records)
    }

    async fn update(&self, record: DocumentRecord) -> RegistryResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.documents.contains_key(&record.id) {
            return Err(RegistryError::NotFound(record.id));
        }
        inner.documents.insert(record.id, record);
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, actor: i64) -> RegistryResult<DocumentRecord> {
        let mut inner = self.inner.write().await;
        let record = inner
            .documents
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;
        if record.is_deleted() {
            return Err(RegistryError::AlreadyDeleted(id));
        }
        record.lifecycle = DocumentLifecycle::SoftDeleted {
            deleted_at: Utc::now(),
            deleted_by: actor,
        };
        Ok(record.clone())
    }

    async fn soft_delete_for_entity(&self, entity: EntityRef, actor: i64) -> RegistryResult<u64> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut flagged = 0;
        for record in inner.documents.values_mut() {
            if record.owner == entity && !record.is_deleted() {
                record.lifecycle = DocumentLifecycle::SoftDeleted {
                    deleted_at: now,
                    deleted_by: actor,
                };
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    async fn remove(&self, id: Uuid) -> RegistryResult<DocumentRecord> {
        let mut inner = self.inner.write().await;
        inner.documents.remove(&id).ok_or(RegistryError::NotFound(id))
    }

    async fn link_child(&self, parent: EntityRef, child: EntityRef) -> RegistryResult<()> {
        let mut inner = self.inner.write().await;
        let children = inner.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
        Ok(())
    }

    async fn children_of(&self, parent: EntityRef) -> RegistryResult<Vec<EntityRef>> {
        let inner = self.inner.read().await;
        Ok(inner.children.get(&parent).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use akiba_core::models::{
        CompressionOutcome, EntityType, FileCategory, PreviewArtifacts, StoredFile,
    };
    use std::path::PathBuf;

    fn record_for(entity: EntityRef, name: &str) -> DocumentRecord {
        let stored = StoredFile {
            original_filename: name.to_string(),
            stored_filename: format!("{}-{name}", Uuid::new_v4().simple()),
            file_path: PathBuf::from(format!("/uploads/{name}")),
            byte_size: 10,
            mime_type: "text/plain".to_string(),
            category: FileCategory::Documents,
            content_hash: "hash".to_string(),
        };
        DocumentRecord::new(
            entity,
            stored,
            CompressionOutcome::uncompressed(10),
            PreviewArtifacts::none(),
            1,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = InMemoryDocumentRegistry::new();
        let entity = EntityRef::new(EntityType::Meeting, 1);
        let record = record_for(entity, "a.txt");
        let id = record.id;

        registry.insert_batch(vec![record]).await.unwrap();
        let fetched = registry.get(id).await.unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn test_soft_deleted_excluded_from_listing_but_fetchable() {
        let registry = InMemoryDocumentRegistry::new();
        let entity = EntityRef::new(EntityType::Meeting, 1);
        let record = record_for(entity, "a.txt");
        let id = record.id;
        registry.insert_batch(vec![record]).await.unwrap();

        let deleted = registry.soft_delete(id, 9).await.unwrap();
        assert!(deleted.is_deleted());

        assert!(registry.list_for_entity(entity).await.unwrap().is_empty());

        let fetched = registry.get(id).await.unwrap();
        assert!(fetched.is_deleted());
    }

    #[tokio::test]
    async fn test_double_soft_delete_rejected() {
        let registry = InMemoryDocumentRegistry::new();
        let entity = EntityRef::new(EntityType::Fine, 2);
        let record = record_for(entity, "b.txt");
        let id = record.id;
        registry.insert_batch(vec![record]).await.unwrap();

        registry.soft_delete(id, 9).await.unwrap();
        assert!(matches!(
            registry.soft_delete(id, 9).await,
            Err(RegistryError::AlreadyDeleted(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_newest_first() {
        let registry = InMemoryDocumentRegistry::new();
        let entity = EntityRef::new(EntityType::Group, 3);

        let mut older = record_for(entity, "old.txt");
        older.upload_date = Utc::now() - chrono::Duration::hours(1);
        let newer = record_for(entity, "new.txt");
        registry.insert_batch(vec![older, newer]).await.unwrap();

        let listed = registry.list_for_entity(entity).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].stored.original_filename, "new.txt");
    }

    #[tokio::test]
    async fn test_soft_delete_for_entity_counts() {
        let registry = InMemoryDocumentRegistry::new();
        let entity = EntityRef::new(EntityType::Activity, 4);
        let other = EntityRef::new(EntityType::Activity, 5);
        registry
            .insert_batch(vec![
                record_for(entity, "a.txt"),
                record_for(entity, "b.txt"),
                record_for(other, "c.txt"),
            ])
            .await
            .unwrap();

        let flagged = registry.soft_delete_for_entity(entity, 7).await.unwrap();
        assert_eq!(flagged, 2);
        assert_eq!(registry.list_for_entity(other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_then_get_is_not_found() {
        let registry = InMemoryDocumentRegistry::new();
        let entity = EntityRef::new(EntityType::Member, 6);
        let record = record_for(entity, "gone.txt");
        let id = record.id;
        registry.insert_batch(vec![record]).await.unwrap();

        registry.remove(id).await.unwrap();
        assert!(matches!(
            registry.get(id).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_hierarchy_links() {
        let registry = InMemoryDocumentRegistry::new();
        let group = EntityRef::new(EntityType::Group, 1);
        let meeting = EntityRef::new(EntityType::Meeting, 10);

        registry.link_child(group, meeting).await.unwrap();
        registry.link_child(group, meeting).await.unwrap(); // no duplicates

        let children = registry.children_of(group).await.unwrap();
        assert_eq!(children, vec![meeting]);
        assert!(registry.children_of(meeting).await.unwrap().is_empty());
    }
}
