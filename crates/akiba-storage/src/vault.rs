//! The vault: owns the storage tree layout and all direct directory
//! manipulation.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use akiba_core::models::{EntityRef, EntityType};

/// Vault operation errors.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VaultResult<T> = Result<T, VaultError>;

/// Local filesystem vault.
///
/// Construction creates the root, one `{entityType}s/` bucket per entity
/// type, and the fixed `thumbnails/`, `previews/`, and `temp/` directories.
#[derive(Clone)]
pub struct DocumentVault {
    root: PathBuf,
}

impl DocumentVault {
    pub async fn new(root: impl Into<PathBuf>) -> VaultResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await?;
        for entity_type in EntityType::ALL {
            fs::create_dir_all(root.join(entity_type.dir_name())).await?;
        }
        fs::create_dir_all(root.join("thumbnails")).await?;
        fs::create_dir_all(root.join("previews")).await?;
        fs::create_dir_all(root.join("temp")).await?;

        tracing::debug!(root = %root.display(), "Document vault initialized");

        Ok(DocumentVault { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject filenames that could escape the storage tree.
    fn validate_filename(filename: &str) -> VaultResult<()> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(VaultError::InvalidFilename(filename.to_string()));
        }
        Ok(())
    }

    /// Directory for an entity's files, without touching the filesystem.
    pub fn entity_dir_path(&self, entity: EntityRef) -> PathBuf {
        self.root
            .join(entity.entity_type.dir_name())
            .join(entity.entity_id.to_string())
    }

    /// Directory for an entity's files, created on demand.
    pub async fn entity_dir(&self, entity: EntityRef) -> VaultResult<PathBuf> {
        let dir = self.entity_dir_path(entity);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Full path for a file within an entity's directory, creating the
    /// directory if absent.
    pub async fn resolve(&self, entity: EntityRef, filename: &str) -> VaultResult<PathBuf> {
        Self::validate_filename(filename)?;
        Ok(self.entity_dir(entity).await?.join(filename))
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join("thumbnails")
    }

    pub fn previews_dir(&self) -> PathBuf {
        self.root.join("previews")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    /// `thumbnails/thumb_{filename}` for a derived thumbnail of `filename`.
    pub fn thumbnail_path_for(&self, filename: &str) -> PathBuf {
        self.thumbnails_dir().join(format!("thumb_{filename}"))
    }

    /// `previews/preview_{stem}.jpg` for a derived preview of a file whose
    /// name (without extension) is `stem`.
    pub fn preview_path_for(&self, stem: &str) -> PathBuf {
        self.previews_dir().join(format!("preview_{stem}.jpg"))
    }

    /// Scratch path under `temp/` for short-lived working copies.
    pub fn temp_path_for(&self, filename: &str) -> PathBuf {
        self.temp_dir().join(filename)
    }

    /// Write bytes to `path` and flush them to disk.
    pub async fn write_bytes(&self, path: &Path, data: &[u8]) -> VaultResult<()> {
        let start = std::time::Instant::now();

        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File written to vault"
        );

        Ok(())
    }
}
