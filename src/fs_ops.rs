//! Filesystem primitives used by the relocator.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use filetime::{FileTime, set_file_times};

/// The mutating filesystem calls a relocation needs.
///
/// `create_dir_all` must succeed when the directory already exists, since
/// concurrent tasks race to create shared destination parents.
#[async_trait]
pub trait FileOps: Send + Sync {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copies file contents, returning the number of bytes written.
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Sets the access and modification times of `to` to those of `from`.
    async fn copy_times(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The local filesystem, through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileOps for LocalFs {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        tokio::fs::copy(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn copy_times(&self, from: &Path, to: &Path) -> io::Result<()> {
        let metadata = tokio::fs::metadata(from).await?;
        let accessed = FileTime::from_last_access_time(&metadata);
        let modified = FileTime::from_last_modification_time(&metadata);
        let to = to.to_path_buf();
        tokio::task::spawn_blocking(move || set_file_times(&to, accessed, modified))
            .await
            .map_err(io::Error::other)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_times_carries_mtime() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("old.jpg");
        let to = dir.path().join("new.jpg");
        std::fs::write(&from, "old").unwrap();
        std::fs::write(&to, "new").unwrap();
        let past = SystemTime::now() - Duration::from_secs(30 * 24 * 3600);
        filetime::set_file_mtime(&from, FileTime::from_system_time(past)).unwrap();

        LocalFs.copy_times(&from, &to).await.unwrap();

        let from_meta = std::fs::metadata(&from).unwrap();
        let to_meta = std::fs::metadata(&to).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&to_meta),
            FileTime::from_last_modification_time(&from_meta)
        );
    }
}
