//! Request DTOs for the Web API.

use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};
use crate::file::UploadRequest;

/// Upload form collected from a multipart request.
///
/// The file content travels separately; this holds only the text fields
/// and the filename taken from the file part.
#[derive(Debug, Clone, Default, Validate)]
pub struct UploadForm {
    /// Uploader email.
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    /// Free-form label.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub label: String,
    /// Filename of the uploaded file part.
    #[validate(
        length(min = 1, max = 255, message = "File must have a filename"),
        custom(function = "no_control_chars")
    )]
    pub filename: String,
}

impl UploadForm {
    /// Convert into the pipeline's upload request.
    pub fn into_request(self) -> UploadRequest {
        UploadRequest::new(self.email.trim(), self.label, self.filename)
    }
}
