//! Multipart upload ingestion.

use axum::extract::Extension;
use axum::extract::multipart::Multipart;
use axum::http::{HeaderMap, header};
use axum::response::{Html, Redirect};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::atomic::AtomicFile;
use crate::config::UploadLimits;
use crate::error::UploadError;
use crate::pages;
use crate::storage::Storage;

/// Multipart field name the form posts files under.
const FILE_FIELD: &str = "photo";

/// Requests hitting `/upload` with anything but POST go back to the form.
pub async fn upload_redirect() -> Redirect {
    Redirect::to("/")
}

/// POST `/upload` — ingest one file from the multipart body.
///
/// A declared Content-Length over the ceiling is rejected before any
/// parsing; bodies without a declared length are still capped by the
/// router's body limit, which surfaces as a read error mid-parse. The
/// bytes stream through an [`AtomicFile`] so a failed or empty upload
/// never leaves a file under a completed name.
pub async fn upload_file(
    Extension(storage): Extension<Arc<Storage>>,
    Extension(limits): Extension<Arc<UploadLimits>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Html<String>, UploadError> {
    if let Some(declared) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        && declared > limits.max_bytes as u64
    {
        return Err(UploadError::TooLarge);
    }

    let mut field = loop {
        match multipart.next_field().await {
            Ok(Some(candidate)) if candidate.name() == Some(FILE_FIELD) => break candidate,
            Ok(Some(_)) => continue,
            Ok(None) => return Err(UploadError::MissingFile),
            Err(_) => return Err(UploadError::MalformedOrTooLarge),
        }
    };

    let original_name = field
        .file_name()
        .map(|name| name.to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "upload".to_string());

    storage
        .ensure_ready()
        .await
        .map_err(UploadError::StorageUnavailable)?;

    let stored_name = Storage::stored_name(&original_name);
    let destination = storage.root_path().join(&stored_name);

    let mut atomic = AtomicFile::create(&destination)
        .await
        .map_err(UploadError::WriteFailed)?;
    let mut total: u64 = 0;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                total += chunk.len() as u64;
                if let Err(err) = atomic.file_mut().write_all(&chunk).await {
                    atomic.cleanup().await;
                    return Err(UploadError::WriteFailed(err));
                }
            }
            Ok(None) => break,
            Err(_) => {
                atomic.cleanup().await;
                return Err(UploadError::MalformedOrTooLarge);
            }
        }
    }

    if total == 0 {
        atomic.cleanup().await;
        return Err(UploadError::EmptyFile);
    }

    atomic.finalize().await.map_err(UploadError::WriteFailed)?;
    info!(
        original = original_name,
        stored = stored_name,
        bytes = total,
        "file stored"
    );

    Ok(Html(pages::success_page(&original_name, &stored_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};
    use tempfile::tempdir;

    use crate::retrieve::serve_upload;

    const BOUNDARY: &str = "lan-drop-test-boundary";

    fn make_storage() -> (tempfile::TempDir, Arc<Storage>) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("uploads");
        (temp, Arc::new(Storage::new(root)))
    }

    fn make_limits() -> Arc<UploadLimits> {
        Arc::new(UploadLimits {
            max_bytes: 50 * 1024 * 1024,
        })
    }

    async fn make_multipart(field: &str, filename: &str, content: &[u8]) -> Multipart {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");
        Multipart::from_request(request, &())
            .await
            .expect("multipart")
    }

    fn stored_entries(storage: &Storage) -> Vec<String> {
        std::fs::read_dir(storage.root_path())
            .expect("read storage dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn upload_stores_file_with_original_extension() {
        let (_temp, storage) = make_storage();
        let multipart = make_multipart(FILE_FIELD, "photo.jpg", b"jpeg bytes").await;

        upload_file(
            Extension(storage.clone()),
            Extension(make_limits()),
            HeaderMap::new(),
            multipart,
        )
        .await
        .unwrap_or_else(|err| panic!("upload failed: {err:?}"));

        let entries = stored_entries(&storage);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with(".jpg"));

        let contents =
            std::fs::read(storage.root_path().join(&entries[0])).expect("read stored file");
        assert_eq!(contents, b"jpeg bytes");
    }

    #[tokio::test]
    async fn empty_file_is_rejected_and_nothing_stored() {
        let (_temp, storage) = make_storage();
        let multipart = make_multipart(FILE_FIELD, "empty.txt", b"").await;

        let result = upload_file(
            Extension(storage.clone()),
            Extension(make_limits()),
            HeaderMap::new(),
            multipart,
        )
        .await;

        assert!(matches!(result, Err(UploadError::EmptyFile)));
        assert!(stored_entries(&storage).is_empty());
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let (_temp, storage) = make_storage();
        let multipart = make_multipart("unrelated", "photo.jpg", b"data").await;

        let result = upload_file(
            Extension(storage),
            Extension(make_limits()),
            HeaderMap::new(),
            multipart,
        )
        .await;

        assert!(matches!(result, Err(UploadError::MissingFile)));
    }

    #[tokio::test]
    async fn declared_oversize_body_fails_fast() {
        let (_temp, storage) = make_storage();
        let limits = Arc::new(UploadLimits { max_bytes: 16 });
        let multipart = make_multipart(FILE_FIELD, "big.bin", b"0123456789abcdef0123").await;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, "1000".parse().expect("header"));
        let result = upload_file(Extension(storage.clone()), Extension(limits), headers, multipart)
            .await;

        assert!(matches!(result, Err(UploadError::TooLarge)));
        assert!(!storage.root_path().exists());
    }

    #[tokio::test]
    async fn truncated_body_is_rejected_without_residue() {
        let (_temp, storage) = make_storage();

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"photo\"; filename=\"cut.bin\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        // payload cut off before the closing boundary
        body.extend_from_slice(b"first half of the payload");

        let request = Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");
        let multipart = Multipart::from_request(request, &())
            .await
            .expect("multipart");

        let result = upload_file(
            Extension(storage.clone()),
            Extension(make_limits()),
            HeaderMap::new(),
            multipart,
        )
        .await;

        assert!(matches!(result, Err(UploadError::MalformedOrTooLarge)));
        if storage.root_path().exists() {
            assert!(stored_entries(&storage).is_empty());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unwritable_root_maps_to_storage_unavailable() {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        let (_temp, storage) = make_storage();
        std::fs::create_dir_all(storage.root_path()).expect("create root");
        std::fs::set_permissions(storage.root_path(), Permissions::from_mode(0o555))
            .expect("set permissions");

        // Permission bits are not enforced for root; nothing to check then.
        if std::fs::write(storage.root_path().join("canary"), b"x").is_ok() {
            std::fs::set_permissions(storage.root_path(), Permissions::from_mode(0o755))
                .expect("restore permissions");
            return;
        }

        let multipart = make_multipart(FILE_FIELD, "photo.jpg", b"data").await;
        let result = upload_file(
            Extension(storage.clone()),
            Extension(make_limits()),
            HeaderMap::new(),
            multipart,
        )
        .await;

        assert!(matches!(result, Err(UploadError::StorageUnavailable(_))));
        std::fs::set_permissions(storage.root_path(), Permissions::from_mode(0o755))
            .expect("restore permissions");
        assert!(stored_entries(&storage).is_empty());
    }

    #[tokio::test]
    async fn non_post_request_redirects_to_form() {
        use axum::http::StatusCode;
        use axum::response::IntoResponse;

        let response = upload_redirect().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).expect("location"),
            "/"
        );
    }

    #[tokio::test]
    async fn upload_then_retrieve_returns_identical_bytes() {
        let (_temp, storage) = make_storage();
        let payload: Vec<u8> = (0..4096u32).flat_map(|n| n.to_le_bytes()).collect();
        let multipart = make_multipart(FILE_FIELD, "blob.bin", &payload).await;

        upload_file(
            Extension(storage.clone()),
            Extension(make_limits()),
            HeaderMap::new(),
            multipart,
        )
        .await
        .unwrap_or_else(|err| panic!("upload failed: {err:?}"));

        let stored = stored_entries(&storage).remove(0);
        let response = serve_upload(
            axum::extract::Path(stored),
            Extension(storage),
        )
        .await
        .unwrap_or_else(|err| panic!("retrieve failed: {err:?}"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert_eq!(body.as_ref(), payload.as_slice());
    }
}
