//! Filebox - a small file storage service.
//!
//! Clients upload a file tagged with an owner email and a label and get
//! back a public identifier for downloading, inspecting or deleting it.
//! Stored files are named by a separate private identifier that never
//! leaves the server.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{FileboxError, Result};
pub use file::{
    DownloadResult, FileRecord, FileRepository, FileService, FileStorage, FileStore,
    MetadataStore, NewFileRecord, UploadRequest,
};
