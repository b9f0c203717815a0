//! Scoped temp-file writing with atomic rename into place.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use uuid::Uuid;

/// Write guard for a destination path. Bytes go to a hidden temp file in
/// the same directory; `finalize` syncs and renames it onto the target,
/// `cleanup` removes it. An interrupted write therefore never leaves a
/// file under the destination name.
pub struct AtomicFile {
    target: PathBuf,
    temp_path: PathBuf,
    file: File,
}

impl AtomicFile {
    pub async fn create(target: &Path) -> io::Result<Self> {
        let parent = target.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "target path has no parent")
        })?;
        let base = target
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| "file".into());
        let temp_path = parent.join(format!(".{base}.tmp.{}", Uuid::new_v4().simple()));
        let file = File::create(&temp_path).await?;
        Ok(Self {
            target: target.to_path_buf(),
            temp_path,
            file,
        })
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Abandon the write and remove the temp file.
    pub async fn cleanup(self) {
        let _ = fs::remove_file(&self.temp_path).await;
    }

    /// Flush to disk and rename the temp file onto the target. The temp
    /// file is removed on either failure, so nothing is left behind.
    pub async fn finalize(self) -> io::Result<()> {
        if let Err(err) = self.file.sync_all().await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(err);
        }
        drop(self.file);

        if let Err(err) = fs::rename(&self.temp_path, &self.target).await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AtomicFile;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn finalize_installs_target() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("out.bin");

        let mut atomic = AtomicFile::create(&target).await.expect("create");
        atomic.file_mut().write_all(b"abc").await.expect("write");
        atomic.finalize().await.expect("finalize");

        assert_eq!(std::fs::read(&target).expect("read"), b"abc");
        let entries = std::fs::read_dir(temp.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn failed_finalize_removes_temp_file() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("occupied");
        std::fs::create_dir_all(target.join("child")).expect("create target dir");

        let mut atomic = AtomicFile::create(&target).await.expect("create");
        atomic.file_mut().write_all(b"data").await.expect("write");
        let result = atomic.finalize().await;

        assert!(result.is_err());
        let entries = std::fs::read_dir(temp.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn cleanup_leaves_no_residue() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("out.bin");

        let mut atomic = AtomicFile::create(&target).await.expect("create");
        atomic.file_mut().write_all(b"partial").await.expect("write");
        atomic.cleanup().await;

        assert!(!target.exists());
        let entries = std::fs::read_dir(temp.path()).expect("read dir").count();
        assert_eq!(entries, 0);
    }
}
