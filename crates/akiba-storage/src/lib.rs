//! Akiba Storage Library
//!
//! Filesystem vault for the document service: path resolution, unique
//! naming, hard deletion with related-artifact cleanup, and storage
//! accounting.
//!
//! # Directory layout
//!
//! ```text
//! {root}/
//!   {entityType}s/{entityId}/{hex}.{ext}       # or {hex}.{ext}.gz when compressed
//!   thumbnails/thumb_{storedFilename}
//!   previews/preview_{stem}.jpg
//!   temp/                                      # scratch space, emptied after use
//! ```
//!
//! Filenames handed to the vault must not contain path separators or `..`;
//! resolution rejects anything that could escape the root.

pub mod delete;
pub mod naming;
pub mod usage;
pub mod vault;

pub use naming::{file_extension, logical_extension, sanitize_filename, unique_stored_name};
pub use vault::{DocumentVault, VaultError, VaultResult};
