//! Document records: the unit the registry tracks per upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::EntityRef;
use super::file::{CompressionOutcome, PreviewArtifacts, StoredFile};

/// Lifecycle of a document record.
///
/// Hard deletion removes the record (and its files) entirely, so it has no
/// variant here; a record you can still fetch is either active or
/// soft-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DocumentLifecycle {
    Active,
    SoftDeleted {
        deleted_at: DateTime<Utc>,
        deleted_by: i64,
    },
}

impl DocumentLifecycle {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DocumentLifecycle::SoftDeleted { .. })
    }
}

/// A document owned by exactly one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub owner: EntityRef,
    pub stored: StoredFile,
    pub compression: CompressionOutcome,
    pub previews: PreviewArtifacts,
    pub uploaded_by: i64,
    pub upload_date: DateTime<Utc>,
    pub lifecycle: DocumentLifecycle,
}

impl DocumentRecord {
    pub fn new(
        owner: EntityRef,
        stored: StoredFile,
        compression: CompressionOutcome,
        previews: PreviewArtifacts,
        uploaded_by: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            stored,
            compression,
            previews,
            uploaded_by,
            upload_date: Utc::now(),
            lifecycle: DocumentLifecycle::Active,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    pub fn has_preview(&self) -> bool {
        self.previews.has_preview()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::EntityType;
    use crate::models::file::FileCategory;
    use std::path::PathBuf;

    fn sample_record() -> DocumentRecord {
        let stored = StoredFile {
            original_filename: "receipt.pdf".to_string(),
            stored_filename: "ab12cd34.pdf".to_string(),
            file_path: PathBuf::from("/uploads/meetings/7/ab12cd34.pdf"),
            byte_size: 2048,
            mime_type: "application/pdf".to_string(),
            category: FileCategory::Documents,
            content_hash: "deadbeef".to_string(),
        };
        DocumentRecord::new(
            EntityRef::new(EntityType::Meeting, 7),
            stored,
            CompressionOutcome::uncompressed(2048),
            PreviewArtifacts::none(),
            101,
        )
    }

    #[test]
    fn test_new_record_is_active() {
        let record = sample_record();
        assert!(!record.is_deleted());
        assert_eq!(record.lifecycle, DocumentLifecycle::Active);
        assert_eq!(record.uploaded_by, 101);
    }

    #[test]
    fn test_soft_deleted_state_flags() {
        let mut record = sample_record();
        record.lifecycle = DocumentLifecycle::SoftDeleted {
            deleted_at: Utc::now(),
            deleted_by: 55,
        };
        assert!(record.is_deleted());
    }

    #[test]
    fn test_record_serializes_lifecycle_tag() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"state\":\"active\""));
    }
}
