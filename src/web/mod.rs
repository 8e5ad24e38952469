//! Web API module for Filebox.
//!
//! This module exposes the file pipeline over HTTP: multipart upload,
//! download, metadata lookup, deletion, and status endpoints.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
