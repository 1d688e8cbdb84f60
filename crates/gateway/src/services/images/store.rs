//! Image files on disk.
//!
//! All images live flat in one directory, named `{file_uid}{ext}`. The
//! storefront references them by a relative URL made of the configured
//! base URL and the file name.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::ImageConfig;

/// File system side of product images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    base_url: String,
}

impl ImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.path.clone(), config.url.clone())
    }

    /// Image directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storefront path for a file name.
    #[must_use]
    pub fn url(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.base_url)
    }

    /// Write `bytes` to `file_name`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created or the file
    /// cannot be written.
    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Image written");
        Ok(path)
    }

    /// File name of the image stored for `file_uid`, whatever its extension.
    ///
    /// Matches `{file_uid}.*`; if several files match, the first in name
    /// order wins.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be read.
    pub async fn find(&self, file_uid: &str) -> io::Result<Option<String>> {
        let prefix = format!("{file_uid}.");
        let mut matches: Vec<String> = self
            .file_names()
            .await?
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect();
        matches.sort();
        Ok(matches.into_iter().next())
    }

    /// Delete every file whose name is not in `referenced`.
    ///
    /// A missing directory holds nothing to collect.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from walking the directory or deleting a
    /// file. Files deleted before the error stay deleted.
    pub async fn collect_garbage(&self, referenced: &HashSet<String>) -> io::Result<u64> {
        let names = match self.file_names().await {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut deleted = 0;
        for name in names.iter().filter(|name| !referenced.contains(*name)) {
            let path = self.dir.join(name);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                error!(error = %e, path = %path.display(), "Failed to delete orphan image");
                return Err(e);
            }
            deleted += 1;
        }

        if deleted > 0 {
            info!(deleted, dir = %self.dir.display(), "Deleted orphan images");
        }
        Ok(deleted)
    }

    async fn file_names(&self) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// File name part of a stored image path.
#[must_use]
pub fn basename(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|name| name.to_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> ImageStore {
        ImageStore::new(dir, "catalog/product/")
    }

    #[test]
    fn test_url_and_basename() {
        let store = ImageStore::new("/tmp/x", "catalog/product/");
        assert_eq!(store.url("abc.jpg"), "catalog/product/abc.jpg");
        assert_eq!(basename("catalog/product/abc.jpg"), Some("abc.jpg"));
        assert_eq!(basename("abc.jpg"), Some("abc.jpg"));
        assert_eq!(basename(""), None);
    }

    #[tokio::test]
    async fn test_write_then_find_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        store.write("abc.png", b"png").await.unwrap();
        store.write("abc.jpg", b"jpg").await.unwrap();
        store.write("abcd.jpg", b"other").await.unwrap();

        assert_eq!(store.find("abc").await.unwrap().as_deref(), Some("abc.jpg"));
        assert_eq!(store.find("abcd").await.unwrap().as_deref(), Some("abcd.jpg"));
        assert_eq!(store.find("zzz").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("nested"));
        let path = store.write("a.jpg", b"x").await.unwrap();
        assert_eq!(tokio::fs::read(path).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_collect_garbage_keeps_referenced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        for name in ["keep.jpg", "main.png", "orphan.jpg", "orphan2.gif"] {
            store.write(name, b"x").await.unwrap();
        }
        tokio::fs::create_dir(dir.path().join("cache")).await.unwrap();

        let referenced: HashSet<String> = ["keep.jpg", "main.png"]
            .into_iter()
            .map(String::from)
            .collect();
        let deleted = store.collect_garbage(&referenced).await.unwrap();

        assert_eq!(deleted, 2);
        assert!(dir.path().join("keep.jpg").exists());
        assert!(dir.path().join("main.png").exists());
        assert!(!dir.path().join("orphan.jpg").exists());
        assert!(dir.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_collect_garbage_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("missing"));
        assert_eq!(store.collect_garbage(&HashSet::new()).await.unwrap(), 0);
    }
}
