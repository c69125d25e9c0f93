//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {folder}/{space}/
//! ├── index.html            # Chronological index of blog/
//! ├── list_blogposts.csv    # Mirror index (ID,type,title)
//! ├── blog/
//! │   └── YYYY-MM-DD_slug.html
//! └── download/
//!     ├── attachments/{page}/name_versionN.ext
//!     └── thumbnails/{page}/name_versionN.ext
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Subfolder holding rendered documents.
pub const BLOG_DIR: &str = "blog";

/// Name of the rebuilt index document.
pub const INDEX_FILE: &str = "index.html";

/// Sequence number making every temp file name unique in the process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local mirror tree rooted at `{folder}/{space}`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Mirror root.
    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: impl AsRef<Path>) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Folder holding rendered documents.
    pub fn blog_dir(&self) -> PathBuf {
        self.path(BLOG_DIR)
    }

    /// Whether a relative key already exists on disk.
    pub async fn exists(&self, key: impl AsRef<Path>) -> bool {
        tokio::fs::try_exists(self.path(key)).await.unwrap_or(false)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !tokio::fs::try_exists(parent).await.unwrap_or(false) {
                log::info!("Creating {}", parent.display());
            }
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// An interrupted download never leaves a file at the final path, so the
    /// existence check used for re-runs stays trustworthy. Every call gets its
    /// own temp file; concurrent writes to one key end with one complete
    /// file, the last rename winning.
    pub async fn write_bytes(&self, key: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        Self::ensure_dir(&path).await?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(format!(
            ".{}-{}.part",
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let tmp = path.with_file_name(tmp_name);

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, &path).await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Io(e));
        }
        Ok(path)
    }

    /// Read bytes, returning None if file doesn't exist.
    pub async fn read_bytes(&self, key: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// File names of rendered documents, sorted.
    ///
    /// Sorting by name sorts by date because of the `YYYY-MM-DD_` prefix.
    pub async fn list_documents(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = match tokio::fs::read_dir(self.blog_dir()).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(AppError::Io(e)),
        };
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".html") {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_bytes("download/attachments/1/a_version1.png", b"hello")
            .await
            .unwrap();
        let data = storage
            .read_bytes("download/attachments/1/a_version1.png")
            .await
            .unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join("download/attachments/1"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec!["a_version1.png"]);
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_same_key() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let key = Path::new(BLOG_DIR).join("2021-03-01_Weekly_update.html");

        let bodies: Vec<Vec<u8>> = (0..16).map(|i| format!("post {i}").into_bytes()).collect();
        let writes = bodies.iter().map(|body| storage.write_bytes(&key, body));
        let results = futures::future::join_all(writes).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let stored = storage.read_bytes(&key).await.unwrap().unwrap();
        assert!(bodies.contains(&stored));
        let names: Vec<_> = std::fs::read_dir(storage.blog_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["2021-03-01_Weekly_update.html"]);
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
        assert!(!storage.exists("nope.txt").await);
    }

    #[tokio::test]
    async fn test_list_documents_sorted() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert!(storage.list_documents().await.unwrap().is_empty());

        for name in ["2022-01-02_c.html", "2021-03-15_b.html", "2021-03-01_a.html"] {
            storage
                .write_bytes(Path::new(BLOG_DIR).join(name), b"<html></html>")
                .await
                .unwrap();
        }
        storage
            .write_bytes(Path::new(BLOG_DIR).join("notes.txt"), b"x")
            .await
            .unwrap();

        assert_eq!(
            storage.list_documents().await.unwrap(),
            vec!["2021-03-01_a.html", "2021-03-15_b.html", "2022-01-02_c.html"]
        );
    }
}
