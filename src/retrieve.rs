//! Serving stored files back over HTTP.

use axum::body::Body;
use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::io;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::error::RetrievalError;
use crate::storage::Storage;

/// GET `/uploads/{*path}` — stream a stored file back.
///
/// Paths containing `..` are refused before the filesystem is touched,
/// and resolution is confined to the storage root, so nothing outside it
/// is ever served.
pub async fn serve_upload(
    Path(path): Path<String>,
    Extension(storage): Extension<Arc<Storage>>,
) -> Result<Response, RetrievalError> {
    if path.contains("..") {
        return Err(RetrievalError::ForbiddenPath);
    }

    storage
        .ensure_ready()
        .await
        .map_err(RetrievalError::StorageUnavailable)?;

    let target = storage
        .resolve(&path)
        .map_err(|_| RetrievalError::ForbiddenPath)?;

    let metadata = match fs::metadata(&target).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RetrievalError::NotFound);
        }
        Err(err) => return Err(RetrievalError::StorageUnavailable(err.into())),
    };
    if metadata.is_dir() {
        return Err(RetrievalError::NotFound);
    }

    let file = match File::open(&target).await {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RetrievalError::NotFound);
        }
        Err(err) => return Err(RetrievalError::StorageUnavailable(err.into())),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&metadata.len().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    if let Ok(modified) = metadata.modified()
        && let Ok(value) = HeaderValue::from_str(&httpdate::fmt_http_date(modified))
    {
        headers.insert(header::LAST_MODIFIED, value);
    }

    info!(path, size = metadata.len(), "serving stored file");
    let stream = ReaderStream::new(file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}
