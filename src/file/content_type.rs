//! Content type resolution from original filenames.

use std::path::Path;

/// Fallback MIME type for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Longest extension (without the dot) accepted for storage names.
const MAX_EXTENSION_LENGTH: usize = 16;

/// Extensions whose MIME type is pinned regardless of the system guess.
const KNOWN_TYPES: &[(&str, &str)] = &[
    (".pdf", "application/pdf"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".doc", "application/msword"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".txt", "text/plain"),
    (".csv", "text/csv"),
    (".json", "application/json"),
    (".zip", "application/zip"),
];

/// Extension and MIME type resolved for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// Lower-cased suffix including the leading dot, or empty.
    pub extension: String,
    /// Best-effort MIME type.
    pub content_type: String,
}

/// Resolve the storage extension and MIME type for an original filename.
///
/// Never fails. Anything that cannot safely be used as part of a file name
/// (separators, dots, control characters, overly long suffixes) yields an
/// empty extension, and unknown extensions map to [`OCTET_STREAM`].
pub fn resolve(original_filename: &str) -> ResolvedType {
    let extension = extract_extension(original_filename);
    let content_type = content_type_for(&extension);

    ResolvedType {
        extension,
        content_type,
    }
}

/// Extract the lower-cased extension (with leading dot) from a filename.
fn extract_extension(filename: &str) -> String {
    // Treat both separators as path separators regardless of platform, so
    // "a.b\\c" never yields an extension containing a backslash.
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");

    let ext = match Path::new(base).extension().and_then(|s| s.to_str()) {
        Some(ext) => ext,
        None => return String::new(),
    };

    if !is_safe_extension(ext) {
        return String::new();
    }

    format!(".{}", ext.to_ascii_lowercase())
}

fn is_safe_extension(ext: &str) -> bool {
    !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LENGTH
        && ext
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}

fn content_type_for(extension: &str) -> String {
    if extension.is_empty() {
        return OCTET_STREAM.to_string();
    }

    if let Some((_, mime)) = KNOWN_TYPES.iter().find(|(ext, _)| *ext == extension) {
        return (*mime).to_string();
    }

    mime_guess::from_ext(&extension[1..])
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
