//! Filename sanitization and collision-free stored names.

use std::path::Path;

use uuid::Uuid;

/// Strip path components and unsafe characters from a user-supplied
/// filename.
///
/// Anything that is not alphanumeric, `.`, `-`, or `_` becomes `_`; names
/// that end up empty or suspiciously short collapse to `"file"`.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Lowercased extension after the last dot; empty when the name has none.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Extension of the logical file, looking through a trailing `.gz` left by
/// the compression engine. `{hex}.txt.gz` yields `txt`; a directly uploaded
/// `{hex}.gz` still yields `gz`.
pub fn logical_extension(filename: &str) -> String {
    if let Some(inner) = filename.strip_suffix(".gz") {
        let inner_ext = file_extension(inner);
        if !inner_ext.is_empty() {
            return inner_ext;
        }
    }
    file_extension(filename)
}

/// Generate a stored filename: 128 bits of hex entropy carrying the
/// original's extension.
///
/// No existence check is made; the name space is large enough that collision
/// probability is negligible.
pub fn unique_stored_name(original_filename: &str) -> String {
    let safe = sanitize_filename(original_filename);
    let extension = file_extension(&safe);
    let hex = Uuid::new_v4().simple().to_string();
    if extension.is_empty() {
        hex
    } else {
        format!("{hex}.{extension}")
    }
}
