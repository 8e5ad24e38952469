//! File storage for Filebox.
//!
//! Stored files live directly under a single storage root and are named
//! `{private_id}{extension}`:
//! ```text
//! {root}/
//! ├── 0f6c1a0e-2b0d-4d8e-9a4e-6f3b2d1c0a99.pdf
//! ├── 7b1e8c44-91f2-4a55-8d0e-2c3b4a5f6e7d
//! └── ...
//! ```
//! Writes go to a hidden temporary file first and are then hard-linked under
//! the final name. A failed write never leaves a partial file under its final
//! name, and an existing stored file is never replaced.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{FileboxError, Result};

/// An opened stored file, ready for sequential reading.
pub struct StoredContent {
    /// Reader over the stored bytes.
    pub reader: Box<dyn AsyncRead + Unpin + Send>,
    /// Size of the stored file in bytes.
    pub len: u64,
}

impl std::fmt::Debug for StoredContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredContent")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Byte storage keyed by private identifier and extension.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write the whole stream and return the number of bytes written.
    async fn write(
        &self,
        private_id: &str,
        extension: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64>;

    /// Open a stored file. Fails with [`FileboxError::NotFound`] if absent.
    async fn read(&self, private_id: &str, extension: &str) -> Result<StoredContent>;

    /// Remove a stored file. Fails with [`FileboxError::NotFound`] if absent.
    async fn delete(&self, private_id: &str, extension: &str) -> Result<()>;

    /// Check whether a stored file is present.
    async fn exists(&self, private_id: &str, extension: &str) -> Result<bool>;
}

/// Disk-backed [`FileStore`] under a single root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Canonical storage root.
    root: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given root.
    ///
    /// The root directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let root = std::fs::canonicalize(&root)?;

        Ok(Self { root })
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the full path for a stored file.
    ///
    /// Fails with [`FileboxError::PathViolation`] unless the name is a
    /// single plain file name directly under the root.
    pub fn file_path(&self, private_id: &str, extension: &str) -> Result<PathBuf> {
        let name = format!("{private_id}{extension}");

        if private_id.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) {
            return Err(FileboxError::PathViolation(name));
        }

        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(FileboxError::PathViolation(name)),
        }

        let path = self.root.join(&name);
        if path.parent() != Some(self.root.as_path()) {
            return Err(FileboxError::PathViolation(name));
        }

        Ok(path)
    }

    fn temp_path(&self, final_path: &Path) -> PathBuf {
        let name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.root.join(format!(".{name}.{}.tmp", Uuid::new_v4()))
    }

    async fn write_temp(
        temp_path: &Path,
        content: &mut (dyn AsyncRead + Unpin + Send),
    ) -> io::Result<u64> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp_path)
            .await?;
        let written = tokio::io::copy(content, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl FileStore for FileStorage {
    async fn write(
        &self,
        private_id: &str,
        extension: &str,
        content: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64> {
        let path = self.file_path(private_id, extension)?;

        if fs::try_exists(&path).await? {
            return Err(FileboxError::DuplicateIdentifier(format!(
                "stored file already exists: {private_id}"
            )));
        }

        let temp_path = self.temp_path(&path);
        let result = match Self::write_temp(&temp_path, content).await {
            // Linking fails if the final name exists, unlike rename.
            Ok(written) => fs::hard_link(&temp_path, &path).await.map(|()| written),
            Err(e) => Err(e),
        };

        if let Err(cleanup) = fs::remove_file(&temp_path).await {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "Failed to remove temporary upload file"
                );
            }
        }

        match result {
            Ok(written) => {
                debug!(path = %path.display(), bytes = written, "Stored file written");
                Ok(written)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(
                FileboxError::DuplicateIdentifier(format!(
                    "stored file already exists: {private_id}"
                )),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, private_id: &str, extension: &str) -> Result<StoredContent> {
        let path = self.file_path(private_id, extension)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FileboxError::NotFound(format!("stored file {private_id}")));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        Ok(StoredContent {
            reader: Box::new(file),
            len,
        })
    }

    async fn delete(&self, private_id: &str, extension: &str) -> Result<()> {
        let path = self.file_path(private_id, extension)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FileboxError::NotFound(format!("stored file {private_id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, private_id: &str, extension: &str) -> Result<bool> {
        let path = self.file_path(private_id, extension)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn setup() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("uploads")).unwrap();
        (temp_dir, storage)
    }

    async fn read_all(storage: &FileStorage, private_id: &str, ext: &str) -> Vec<u8> {
        let mut content = storage.read(private_id, ext).await.unwrap();
        let mut buf = Vec::new();
        content.reader.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[test]
    fn test_new_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("a").join("b");

        let storage = FileStorage::new(&root).unwrap();

        assert!(root.is_dir());
        assert!(storage.root().is_absolute());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_temp, storage) = setup();
        let data = b"Hello, World!".to_vec();

        let written = storage
            .write("abc", ".txt", &mut data.as_slice())
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert!(storage.root().join("abc.txt").is_file());
        assert_eq!(read_all(&storage, "abc", ".txt").await, data);
        assert_eq!(storage.read("abc", ".txt").await.unwrap().len, 13);
    }

    #[tokio::test]
    async fn test_write_empty_stream() {
        let (_temp, storage) = setup();

        let written = storage.write("empty", "", &mut &b""[..]).await.unwrap();

        assert_eq!(written, 0);
        assert!(storage.exists("empty", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let (_temp, storage) = setup();
        storage.write("abc", ".bin", &mut &b"xyz"[..]).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(storage.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["abc.bin".to_string()]);
    }

    #[tokio::test]
    async fn test_write_refuses_existing_file() {
        let (_temp, storage) = setup();
        storage.write("abc", ".txt", &mut &b"first"[..]).await.unwrap();

        let result = storage.write("abc", ".txt", &mut &b"second"[..]).await;

        assert!(matches!(result, Err(FileboxError::DuplicateIdentifier(_))));
        assert_eq!(read_all(&storage, "abc", ".txt").await, b"first");
    }

    #[tokio::test]
    async fn test_concurrent_writes_same_name_one_wins() {
        let (_temp, storage) = setup();
        let storage = std::sync::Arc::new(storage);

        for i in 0..50 {
            let id = format!("id-{i}");
            let first = vec![1u8; 64 * 1024];
            let second = vec![2u8; 64 * 1024];

            let a = {
                let storage = storage.clone();
                let id = id.clone();
                tokio::spawn(async move { storage.write(&id, ".bin", &mut first.as_slice()).await })
            };
            let b = {
                let storage = storage.clone();
                let id = id.clone();
                tokio::spawn(async move { storage.write(&id, ".bin", &mut second.as_slice()).await })
            };

            let winner = match (a.await.unwrap(), b.await.unwrap()) {
                (Ok(_), Err(FileboxError::DuplicateIdentifier(_))) => 1u8,
                (Err(FileboxError::DuplicateIdentifier(_)), Ok(_)) => 2u8,
                other => panic!("expected exactly one successful write, got {other:?}"),
            };

            let stored = read_all(&storage, &id, ".bin").await;
            assert_eq!(stored.len(), 64 * 1024);
            assert!(stored.iter().all(|&byte| byte == winner));
        }

        let temp_files = std::fs::read_dir(storage.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .count();
        assert_eq!(temp_files, 0);
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (_temp, storage) = setup();

        let result = storage.read("missing", ".txt").await;
        assert!(matches!(result, Err(FileboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp, storage) = setup();
        storage.write("abc", ".txt", &mut &b"data"[..]).await.unwrap();

        storage.delete("abc", ".txt").await.unwrap();

        assert!(!storage.exists("abc", ".txt").await.unwrap());
        let result = storage.delete("abc", ".txt").await;
        assert!(matches!(result, Err(FileboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_exists() {
        let (_temp, storage) = setup();
        assert!(!storage.exists("abc", ".txt").await.unwrap());

        storage.write("abc", ".txt", &mut &b"data"[..]).await.unwrap();
        assert!(storage.exists("abc", ".txt").await.unwrap());
        assert!(!storage.exists("abc", ".pdf").await.unwrap());
    }

    #[test]
    fn test_file_path_inside_root() {
        let (_temp, storage) = setup();

        let path = storage.file_path("abc", ".pdf").unwrap();
        assert_eq!(path, storage.root().join("abc.pdf"));
    }

    #[test]
    fn test_file_path_rejects_traversal() {
        let (_temp, storage) = setup();

        for (id, ext) in [
            ("abc", "/../../etc/passwd"),
            ("..", ""),
            ("../escape", ""),
            ("abc", "\\..\\evil"),
            ("/etc/passwd", ""),
            ("", ".txt"),
            ("", ""),
            (".hidden", ""),
            ("abc", "\0"),
        ] {
            let result = storage.file_path(id, ext);
            assert!(
                matches!(result, Err(FileboxError::PathViolation(_))),
                "expected path violation for {id:?} + {ext:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_operations_reject_traversal() {
        let (temp, storage) = setup();
        let outside = temp.path().join("outside.txt");
        std::fs::write(&outside, b"keep").unwrap();

        let write = storage
            .write("..", "/outside.txt", &mut &b"overwrite"[..])
            .await;
        let read = storage.read("..", "/outside.txt").await;
        let delete = storage.delete("..", "/outside.txt").await;

        assert!(matches!(write, Err(FileboxError::PathViolation(_))));
        assert!(matches!(read, Err(FileboxError::PathViolation(_))));
        assert!(matches!(delete, Err(FileboxError::PathViolation(_))));
        assert_eq!(std::fs::read(&outside).unwrap(), b"keep");
    }
}
