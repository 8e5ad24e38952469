//! Response DTOs for the Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::file::FileRecord;

/// Upload response.
#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    /// Always true on success.
    pub success: bool,
    /// Public identifier of the stored file.
    pub public_id: String,
    /// Relative download URL.
    pub public_url: String,
    /// Human-readable summary.
    pub message: String,
    /// Stored record.
    pub file: FileInfo,
}

impl FileUploadResponse {
    /// Build the response for a freshly stored record.
    pub fn from_record(record: FileRecord) -> Self {
        let message = format!(
            "File '{}' uploaded successfully ({} bytes)",
            record.original_filename,
            group_thousands(record.file_size)
        );
        Self {
            success: true,
            public_id: record.public_id.clone(),
            public_url: download_url(&record.public_id),
            message,
            file: FileInfo::from(record),
        }
    }
}

/// File metadata as exposed to clients.
#[derive(Debug, Serialize)]
pub struct FileInfo {
    /// Public identifier.
    pub public_id: String,
    /// Uploader email.
    pub email: String,
    /// Label.
    pub label: String,
    /// Original filename.
    pub original_filename: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileInfo {
    fn from(record: FileRecord) -> Self {
        Self {
            public_id: record.public_id,
            email: record.owner_email,
            label: record.label,
            original_filename: record.original_filename,
            content_type: record.content_type,
            file_size: record.file_size,
            created_at: record.created_at,
        }
    }
}

/// File info response.
#[derive(Debug, Serialize)]
pub struct FileInfoResponse {
    /// File metadata.
    #[serde(flatten)]
    pub file: FileInfo,
    /// Whether the stored bytes are present.
    pub file_exists_on_disk: bool,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always true on success.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
}

/// Service description returned by `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    /// Service name.
    pub message: String,
    /// Crate version.
    pub version: String,
    /// Storage root.
    pub upload_dir: String,
    /// Whether the storage root exists.
    pub upload_dir_exists: bool,
    /// Allowed CORS origins (empty means any).
    pub cors_origins: Vec<String>,
}

/// Storage root status in the health report.
#[derive(Debug, Serialize)]
pub struct UploadDirectoryStatus {
    /// Storage root.
    pub path: String,
    /// Whether the path exists.
    pub exists: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
}

/// Health report returned by `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    /// `connected` or `disconnected`.
    pub database: String,
    /// Storage root status.
    pub upload_directory: UploadDirectoryStatus,
    /// Allowed CORS origins (empty means any).
    pub cors_origins: Vec<String>,
}

/// Relative download URL for a public identifier.
pub fn download_url(public_id: &str) -> String {
    format!("/download/{public_id}")
}

/// Format a number with comma thousands separators.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FileRecord {
        FileRecord {
            public_id: "pub-1".to_string(),
            private_id: "priv-1".to_string(),
            owner_email: "user@example.com".to_string(),
            label: "cv".to_string(),
            original_filename: "resume.pdf".to_string(),
            file_extension: ".pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 1234567,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_upload_response() {
        let response = FileUploadResponse::from_record(record());

        assert!(response.success);
        assert_eq!(response.public_url, "/download/pub-1");
        assert_eq!(
            response.message,
            "File 'resume.pdf' uploaded successfully (1,234,567 bytes)"
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("priv-1"));
    }

    #[test]
    fn test_info_response_is_flat() {
        let response = FileInfoResponse {
            file: FileInfo::from(record()),
            file_exists_on_disk: true,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["public_id"], "pub-1");
        assert_eq!(json["email"], "user@example.com");
        assert_eq!(json["file_exists_on_disk"], true);
        assert!(json.get("private_id").is_none());
        assert!(json.get("file_extension").is_none());
    }
}
