//! Akiba Processing Library
//!
//! File-content processing for the document vault: conditional gzip
//! compression, metadata extraction (content hash, MIME, dimensions, page
//! counts), upload validation, and the per-media-type preview pipelines.

pub mod compression;
pub mod metadata;
pub mod preview;
pub mod validator;

pub use compression::{compress_file, decompress_file, CompressionError, CompressionResult};
pub use metadata::{extract_metadata, FileMetadata};
pub use preview::PreviewGenerator;
pub use validator::{UploadValidator, ValidationError};
