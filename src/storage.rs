//! Storage directory provisioning, path resolution and stored-file naming.

use chrono::Utc;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// The single flat directory holding all uploaded files.
#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Make sure the storage root exists and is readable and writable.
    ///
    /// A missing root is created (with parents) at mode 0755. An existing
    /// root is checked by listing it and by writing then removing a
    /// disposable probe file; failure to remove the probe is ignored since
    /// it does not block the caller's request. Idempotent and cheap, so it
    /// runs before every upload and retrieval as well as at startup.
    pub async fn ensure_ready(&self) -> Result<(), StorageError> {
        match fs::metadata(&self.root).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let mut builder = fs::DirBuilder::new();
                builder.recursive(true);
                #[cfg(unix)]
                builder.mode(0o755);
                builder
                    .create(&self.root)
                    .await
                    .map_err(StorageError::CreateFailed)?;
                info!(root = %self.root.display(), "created storage directory");
                Ok(())
            }
            Err(err) => Err(StorageError::CreateFailed(err)),
            Ok(metadata) if !metadata.is_dir() => {
                Err(StorageError::CreateFailed(io::Error::other(
                    "storage root exists but is not a directory",
                )))
            }
            Ok(_) => self.check_permissions().await,
        }
    }

    async fn check_permissions(&self) -> Result<(), StorageError> {
        fs::read_dir(&self.root)
            .await
            .map_err(StorageError::PermissionDenied)?;

        let probe = self
            .root
            .join(format!(".probe-{}", Uuid::new_v4().simple()));
        fs::write(&probe, b"probe")
            .await
            .map_err(StorageError::PermissionDenied)?;
        let _ = fs::remove_file(&probe).await;
        Ok(())
    }

    /// Resolve a request-supplied relative path inside the storage root.
    ///
    /// Normalizes component by component; parent-directory, root and
    /// prefix components are rejected so the result cannot escape the
    /// root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let trimmed = relative.trim_start_matches(['/', '\\']);
        let mut normalized = PathBuf::new();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(segment) => normalized.push(segment),
                Component::CurDir => continue,
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath);
                }
            }
        }
        Ok(self.root.join(normalized))
    }

    /// Generate a stored filename: nanosecond wall-clock timestamp, a
    /// random token so two uploads in the same tick cannot collide, and
    /// the original extension carried over verbatim.
    pub fn stored_name(original: &str) -> String {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let token = Uuid::new_v4().simple().to_string();
        let ext = Path::new(original)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        format!("{}-{}{}", nanos, &token[..8], ext)
    }
}

#[derive(Debug)]
pub enum StorageError {
    CreateFailed(io::Error),
    PermissionDenied(io::Error),
    InvalidPath,
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::CreateFailed(err) => {
                write!(f, "could not create storage directory: {err}")
            }
            StorageError::PermissionDenied(err) => {
                write!(f, "storage directory permission check failed: {err}")
            }
            StorageError::InvalidPath => write!(f, "invalid path"),
            StorageError::Io(err) => write!(f, "{err}"),
        }
    }
}
