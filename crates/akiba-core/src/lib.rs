//! Akiba Core Library
//!
//! This crate provides the core domain models, error types, configuration,
//! and constants shared across all Akiba document-vault components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::VaultConfig;
pub use error::AppError;
pub use models::{
    CascadeStats, CompressionOutcome, DocumentLifecycle, DocumentRecord, EntityRef, EntityType,
    FileCategory, PreviewArtifacts, StorageUsage, StoredFile, UsageBucket,
};
