//! File management module for Filebox.
//!
//! This module provides the upload/info/download/delete pipeline:
//! - Public/private identifier pairs per stored file
//! - Extension and MIME type resolution
//! - SQLite file metadata
//! - Disk storage keyed by private identifier

pub mod content_type;
mod id;
mod metadata;
mod service;
mod storage;

pub use content_type::{resolve, ResolvedType, OCTET_STREAM};
pub use id::FileIds;
pub use metadata::{FileRecord, FileRepository, MetadataStore, NewFileRecord};
pub use service::{DownloadResult, FileService, UploadRequest};
pub use storage::{FileStorage, FileStore, StoredContent};

/// Default maximum file size (50MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
