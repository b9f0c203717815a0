//! Boundary error types for the upload and retrieval handlers.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::io;

use crate::pages;
use crate::storage::StorageError;

/// Everything that can go wrong while ingesting one upload. Converted at
/// the handler boundary into the HTML error page the form links back from.
#[derive(Debug)]
pub enum UploadError {
    TooLarge,
    MalformedOrTooLarge,
    MissingFile,
    EmptyFile,
    StorageUnavailable(StorageError),
    WriteFailed(io::Error),
}

impl UploadError {
    pub fn message(&self) -> String {
        match self {
            UploadError::TooLarge => "The upload exceeds the size limit.".into(),
            UploadError::MalformedOrTooLarge => {
                "The upload could not be read. The form data may be malformed or over the size limit."
                    .into()
            }
            UploadError::MissingFile => "No file was included in the upload.".into(),
            UploadError::EmptyFile => "The selected file is empty.".into(),
            UploadError::StorageUnavailable(err) => {
                format!("The upload directory is unavailable: {err}")
            }
            UploadError::WriteFailed(err) => format!("Saving the file failed: {err}"),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        tracing::warn!(error = ?self, "upload rejected");
        Html(pages::error_page(&self.message())).into_response()
    }
}

/// Failures while serving a stored file, mapped to plain status responses.
#[derive(Debug)]
pub enum RetrievalError {
    ForbiddenPath,
    StorageUnavailable(StorageError),
    NotFound,
}

impl IntoResponse for RetrievalError {
    fn into_response(self) -> Response {
        match self {
            RetrievalError::ForbiddenPath => {
                (StatusCode::FORBIDDEN, "forbidden path").into_response()
            }
            RetrievalError::StorageUnavailable(err) => {
                tracing::error!(%err, "storage unavailable during retrieval");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable").into_response()
            }
            RetrievalError::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
        }
    }
}
