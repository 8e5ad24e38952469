//! API handlers for the Web API.

pub mod file;
pub mod health;

pub use file::*;
pub use health::*;

use std::path::PathBuf;

use crate::db::Database;
use crate::file::FileService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// File pipeline.
    pub service: FileService,
    /// Database, for health checks.
    pub db: Database,
    /// Storage root, for status reporting.
    pub storage_root: PathBuf,
    /// Allowed CORS origins (empty means any).
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: FileService, db: Database, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            service,
            db,
            storage_root: storage_root.into(),
            cors_origins: Vec::new(),
        }
    }

    /// Set the allowed CORS origins reported by the status endpoints.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Get the largest accepted upload in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.service.max_file_size()
    }
}
