//! File service for Filebox.
//!
//! This module ties identifier generation, content type resolution, byte
//! storage and metadata together into the four file operations:
//! - Upload, with orphan-file compensation when the metadata insert fails
//! - Info, answered from metadata alone
//! - Download, reporting a missing stored file as a corrupted record
//! - Delete, removing the stored file before the metadata row

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::{FileboxError, Result};

use super::content_type;
use super::id::FileIds;
use super::metadata::{FileRecord, FileRepository, MetadataStore, NewFileRecord};
use super::storage::{FileStorage, FileStore};
use super::DEFAULT_MAX_FILE_SIZE;

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Uploader email.
    pub email: String,
    /// Free-form label.
    pub label: String,
    /// Original filename as supplied by the client.
    pub filename: String,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(
        email: impl Into<String>,
        label: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            label: label.into(),
            filename: filename.into(),
        }
    }
}

/// Result of a file download.
pub struct DownloadResult {
    /// Reader over the stored bytes.
    pub reader: Box<dyn AsyncRead + Unpin + Send>,
    /// Resolved MIME type.
    pub content_type: String,
    /// Filename for the content disposition.
    pub original_filename: String,
    /// Size in bytes.
    pub file_size: u64,
}

impl std::fmt::Debug for DownloadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResult")
            .field("content_type", &self.content_type)
            .field("original_filename", &self.original_filename)
            .field("file_size", &self.file_size)
            .finish_non_exhaustive()
    }
}

/// File service coordinating metadata and byte storage.
#[derive(Clone)]
pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    store: Arc<dyn FileStore>,
    max_file_size: u64,
}

impl FileService {
    /// Create a new FileService over the given collaborators.
    pub fn new(metadata: Arc<dyn MetadataStore>, store: Arc<dyn FileStore>) -> Self {
        Self {
            metadata,
            store,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Create a FileService backed by SQLite metadata and disk storage
    /// under the configured storage root.
    pub fn from_config(config: &Config, db: &Database) -> Result<Self> {
        let storage = FileStorage::new(&config.storage.path)?;
        let repo = FileRepository::new(db.pool().clone());

        Ok(Self::new(Arc::new(repo), Arc::new(storage))
            .with_max_file_size(config.storage.max_upload_size_bytes()))
    }

    /// Set the largest accepted upload in bytes.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Get the largest accepted upload in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Upload a file.
    ///
    /// The size stored in the record is the number of bytes actually
    /// written. If the metadata insert fails, the written file is removed
    /// before the error is returned.
    pub async fn upload(
        &self,
        request: &UploadRequest,
        content: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<FileRecord> {
        if request.email.trim().is_empty() {
            return Err(FileboxError::InvalidInput("email is required".to_string()));
        }
        if request.label.trim().is_empty() {
            return Err(FileboxError::InvalidInput("label is required".to_string()));
        }

        info!(
            email = %request.email,
            label = %request.label,
            filename = %request.filename,
            "Upload started"
        );

        let ids = FileIds::generate();
        debug!(
            public_id = %ids.public_id,
            private_id = %ids.private_id,
            "Identifiers generated"
        );

        let resolved = content_type::resolve(&request.filename);

        // One byte past the limit is enough to detect an oversized stream.
        let mut limited = (&mut *content).take(self.max_file_size.saturating_add(1));
        let file_size = match self
            .store
            .write(&ids.private_id, &resolved.extension, &mut limited)
            .await
        {
            Ok(size) => size,
            Err(e) => {
                error!(public_id = %ids.public_id, error = %e, "Failed to write stored file");
                return Err(e);
            }
        };

        if file_size > self.max_file_size {
            warn!(
                public_id = %ids.public_id,
                max_file_size = self.max_file_size,
                "Upload exceeds size limit"
            );
            self.discard(&ids, &resolved.extension).await;
            return Err(FileboxError::InvalidInput(format!(
                "file exceeds maximum size of {} bytes",
                self.max_file_size
            )));
        }

        info!(public_id = %ids.public_id, file_size, "File saved");

        let new_record = NewFileRecord {
            public_id: ids.public_id.clone(),
            private_id: ids.private_id.clone(),
            owner_email: request.email.clone(),
            label: request.label.clone(),
            original_filename: request.filename.clone(),
            file_extension: resolved.extension.clone(),
            content_type: resolved.content_type,
            file_size,
        };

        let record = match self.metadata.insert(&new_record).await {
            Ok(record) => record,
            Err(e) => {
                error!(public_id = %ids.public_id, error = %e, "Metadata insert failed");
                self.discard(&ids, &resolved.extension).await;
                return Err(e);
            }
        };

        info!(
            public_id = %record.public_id,
            file_size = record.file_size,
            content_type = %record.content_type,
            "Upload completed"
        );

        Ok(record)
    }

    /// Remove a stored file that has no metadata row.
    async fn discard(&self, ids: &FileIds, extension: &str) {
        match self.store.delete(&ids.private_id, extension).await {
            Ok(()) => debug!(public_id = %ids.public_id, "Removed unrecorded stored file"),
            Err(e) => error!(
                public_id = %ids.public_id,
                error = %e,
                "Failed to remove unrecorded stored file"
            ),
        }
    }

    /// Get the record for a public identifier.
    pub async fn info(&self, public_id: &str) -> Result<FileRecord> {
        debug!(public_id, "File info requested");
        self.metadata.get(public_id).await
    }

    /// Open a file for download.
    ///
    /// Fails with [`FileboxError::CorruptedRecord`] if the record exists but
    /// its stored file is missing or has a different size.
    pub async fn download(&self, public_id: &str) -> Result<DownloadResult> {
        info!(public_id, "Download requested");

        let record = self.metadata.get(public_id).await?;
        debug!(
            public_id,
            original_filename = %record.original_filename,
            "File record found"
        );

        let stored = match self
            .store
            .read(&record.private_id, &record.file_extension)
            .await
        {
            Ok(stored) => stored,
            Err(FileboxError::NotFound(_)) => {
                error!(public_id, "Stored file missing for existing record");
                return Err(FileboxError::CorruptedRecord(format!(
                    "stored file missing for {public_id}"
                )));
            }
            Err(e) => return Err(e),
        };

        if stored.len != record.file_size {
            error!(
                public_id,
                expected = record.file_size,
                actual = stored.len,
                "Stored file size does not match record"
            );
            return Err(FileboxError::CorruptedRecord(format!(
                "stored file size mismatch for {public_id}"
            )));
        }

        info!(public_id, file_size = record.file_size, "Download completed");

        Ok(DownloadResult {
            reader: stored.reader,
            content_type: record.content_type,
            original_filename: record.original_filename,
            file_size: record.file_size,
        })
    }

    /// Delete a file and its record.
    ///
    /// The stored file is removed first. A stored file that is already gone
    /// does not prevent the record from being removed. Returns the removed
    /// record.
    pub async fn delete(&self, public_id: &str) -> Result<FileRecord> {
        info!(public_id, "Deletion requested");

        let record = self.metadata.get(public_id).await?;

        match self
            .store
            .delete(&record.private_id, &record.file_extension)
            .await
        {
            Ok(()) => info!(public_id, "Physical file deleted"),
            Err(FileboxError::NotFound(_)) => {
                warn!(public_id, "Physical file already missing, removing record")
            }
            Err(e) => {
                error!(public_id, error = %e, "Failed to delete physical file");
                return Err(e);
            }
        }

        self.metadata.delete(public_id).await?;
        info!(
            public_id,
            original_filename = %record.original_filename,
            "Deletion completed"
        );

        Ok(record)
    }

    /// Check whether the stored bytes for a public identifier are present.
    pub async fn file_exists(&self, public_id: &str) -> Result<bool> {
        let record = self.metadata.get(public_id).await?;
        self.stored_file_exists(&record).await
    }

    /// Look up a record and check its stored bytes from that single lookup.
    pub async fn info_with_presence(&self, public_id: &str) -> Result<(FileRecord, bool)> {
        let record = self.info(public_id).await?;
        let exists = self.stored_file_exists(&record).await?;
        Ok((record, exists))
    }

    async fn stored_file_exists(&self, record: &FileRecord) -> Result<bool> {
        self.store
            .exists(&record.private_id, &record.file_extension)
            .await
    }
}
