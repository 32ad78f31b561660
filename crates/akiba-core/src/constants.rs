//! Fixed limits, extension allow-lists, and the MIME lookup table.

/// Hard cap on a single uploaded file. Files above this are rejected before
/// any disk write.
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Files at or below this size are never auto-compressed.
pub const COMPRESSION_THRESHOLD_BYTES: u64 = 5 * 1024 * 1024;

/// Default gzip compression level (1-9).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compression must shave at least 10% off the original size to be kept.
pub const MIN_COMPRESSION_GAIN: f64 = 0.9;

/// Bounding box for listing thumbnails (width, height).
pub const THUMBNAIL_MAX: (u32, u32) = (300, 300);

/// Bounding box for detail-pane previews (width, height).
pub const PREVIEW_MAX: (u32, u32) = (800, 600);

/// Rasterization DPI for PDF page rendering.
pub const PDF_PREVIEW_DPI: u32 = 150;

/// JPEG quality for derived thumbnail/preview images.
pub const DERIVED_JPEG_QUALITY: u8 = 85;

/// Chunk size for streaming content hashing.
pub const HASH_CHUNK_SIZE: usize = 4096;

pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "txt", "csv", "odt", "ods",
];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv"];
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// Extensions whose content is already entropy-coded; gzipping these wastes
/// CPU for negligible or negative gain.
pub const PRECOMPRESSED_EXTENSIONS: &[&str] =
    &["zip", "rar", "7z", "gz", "jpg", "jpeg", "png", "mp4", "mp3"];

/// True if the extension appears in any category allow-list.
pub fn is_allowed_extension(extension: &str) -> bool {
    let ext = extension.to_lowercase();
    [
        DOCUMENT_EXTENSIONS,
        IMAGE_EXTENSIONS,
        VIDEO_EXTENSIONS,
        ARCHIVE_EXTENSIONS,
        AUDIO_EXTENSIONS,
    ]
    .iter()
    .any(|set| set.contains(&ext.as_str()))
}

/// Extension-based MIME lookup. Unknown extensions map to
/// `application/octet-stream`.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "mkv" => "video/x-matroska",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
