use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::snapshot::ImageSnapshot;
use thiserror::Error;

const DOWNLOAD_PREFIX: &str = "snapmend-";
const DOWNLOAD_SUBDIR: &str = "Pictures";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

pub trait SnapshotStorage {
    fn save_snapshot(&self, snapshot: &ImageSnapshot) -> StorageResult<PathBuf>;
}

/// Writes downloaded snapshots as PNG files into one directory.
#[derive(Debug, Clone)]
pub struct StorageService {
    downloads_dir: PathBuf,
}

impl StorageService {
    pub const fn with_path(downloads_dir: PathBuf) -> Self {
        Self { downloads_dir }
    }

    /// Uses `override_dir` when given, otherwise `$HOME/Pictures`.
    pub fn with_default_path(override_dir: Option<&Path>) -> StorageResult<Self> {
        let downloads_dir = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
                PathBuf::from(home).join(DOWNLOAD_SUBDIR)
            }
        };
        Ok(Self::with_path(downloads_dir))
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn target_path_for(&self, snapshot: &ImageSnapshot) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.downloads_dir
            .join(format!("{DOWNLOAD_PREFIX}{stamp}-{}.png", snapshot.id()))
    }

    pub fn save_snapshot(&self, snapshot: &ImageSnapshot) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.downloads_dir)?;
        let target = self.target_path_for(snapshot);
        fs::write(&target, snapshot.encoded())?;
        tracing::info!(path = %target.display(), "snapshot downloaded");
        Ok(target)
    }
}

impl SnapshotStorage for StorageService {
    fn save_snapshot(&self, snapshot: &ImageSnapshot) -> StorageResult<PathBuf> {
        self.save_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::solid_snapshot;

    #[test]
    fn target_path_uses_prefix_and_snapshot_id() {
        let service = StorageService::with_path(PathBuf::from("/home/test/Pictures"));
        let snapshot = solid_snapshot(1, 1, [0, 0, 0, 255]);
        let path = service.target_path_for(&snapshot);

        assert!(path.starts_with("/home/test/Pictures"));
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("file name");
        assert!(name.starts_with(DOWNLOAD_PREFIX));
        assert!(name.ends_with(&format!("-{}.png", snapshot.id())));
    }

    #[test]
    fn override_dir_takes_precedence() {
        let service = StorageService::with_default_path(Some(Path::new("/tmp/exports")))
            .expect("service should build");
        assert_eq!(service.downloads_dir(), Path::new("/tmp/exports"));
    }

    #[test]
    fn save_snapshot_writes_png_bytes_and_creates_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = StorageService::with_path(dir.path().join("nested"));
        let snapshot = solid_snapshot(3, 3, [1, 2, 3, 255]);

        let path = service.save_snapshot(&snapshot).expect("save should work");
        assert_eq!(std::fs::read(&path).expect("read back"), snapshot.encoded());
        let reloaded = image::open(&path).expect("png should open").to_rgba8();
        assert_eq!(reloaded.dimensions(), (3, 3));
    }
}
