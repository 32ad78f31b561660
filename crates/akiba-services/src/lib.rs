//! Akiba Services Library
//!
//! Orchestration on top of the vault and processing crates: the ingestion
//! pipeline, the document registry seam, the deletion & cascade manager,
//! and the `DocumentService` facade the web layer talks to.

pub mod cascade;
pub mod pipeline;
pub mod registry;
pub mod service;

pub use cascade::CascadeManager;
pub use pipeline::{IngestOptions, IngestionPipeline, StoredFileInfo, TempCopy};
pub use registry::{DocumentRegistry, InMemoryDocumentRegistry, RegistryError};
pub use service::{BatchError, BatchUploadOutcome, DocumentService, UploadRequest};
