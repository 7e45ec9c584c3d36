//! Directory-backed file store.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs::File;

use crate::storage::FileStore;

/// Serves files from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL-style path onto the root, refusing anything that would
    /// leave it.
    fn locate(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("open {}: path escapes site root", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStore for DirectoryStore {
    type File = File;

    async fn open(&self, path: &str) -> io::Result<File> {
        let location = self.locate(path)?;
        let file = File::open(&location)
            .await
            .map_err(|e| io::Error::new(e.kind(), format!("open {}: {}", path, e)))?;

        if file.metadata().await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("open {}: is a directory", path),
            ));
        }
        Ok(file)
    }
}
