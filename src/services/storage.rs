use crate::utils::validation::is_safe_segment;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("video not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage directory unavailable: {0}")]
    Unavailable(#[source] std::io::Error),

    /// The incoming byte stream failed before it was fully written.
    #[error("upload stream failed: {0}")]
    Source(#[source] std::io::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// An opened stored video, positioned at its first byte.
pub struct VideoObject {
    pub file: fs::File,
    pub size: u64,
    /// None on platforms without modification times.
    pub modified: Option<SystemTime>,
}

/// Backend holding the stored videos. The backend is the only catalog:
/// `list` always reflects what is stored at the time of the call.
#[async_trait]
pub trait VideoStorage: Send + Sync {
    /// Writes the stream under `filename`, replacing any existing video.
    /// Returns the number of bytes written.
    async fn save_stream<'a>(
        &self,
        filename: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> StorageResult<u64>;

    async fn open(&self, filename: &str) -> StorageResult<VideoObject>;

    /// Names of every stored entry, in backend enumeration order.
    async fn list(&self) -> StorageResult<Vec<String>>;

    async fn is_available(&self) -> bool;
}

/// Flat local directory storage.
#[derive(Debug, Clone)]
pub struct LocalVideoStorage {
    root: PathBuf,
}

impl LocalVideoStorage {
    /// Opens the storage directory, creating it if it does not exist.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(StorageError::Unavailable)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, filename: &str) -> StorageResult<PathBuf> {
        if !is_safe_segment(filename) {
            return Err(StorageError::InvalidKey(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}

#[async_trait]
impl VideoStorage for LocalVideoStorage {
    async fn save_stream<'a>(
        &self,
        filename: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> StorageResult<u64> {
        let path = self.resolve(filename)?;
        let start = Instant::now();

        // Stage next to the target so the final rename stays on one filesystem.
        // The staging name carries no video extension and is never listed.
        let staging = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(".part")
            .tempfile_in(&self.root)?;
        let mut out = fs::File::from_std(staging.reopen()?);

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut total: u64 = 0;
        loop {
            let n = reader.read(&mut buffer).await.map_err(StorageError::Source)?;
            if n == 0 {
                break;
            }
            out.write_all(&buffer[..n]).await?;
            total += n as u64;
        }
        out.flush().await?;
        out.sync_all().await?;
        drop(out);

        staging.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        tracing::info!(
            path = %path.display(),
            filename = %filename,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored video"
        );

        Ok(total)
    }

    async fn open(&self, filename: &str) -> StorageResult<VideoObject> {
        let path = self.resolve(filename)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(filename.to_string()));
        }

        Ok(VideoObject {
            file,
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(StorageError::Unavailable)?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StorageError::Unavailable)?
        {
            // Follows symlinks; only regular files are videos.
            let is_file = fs::metadata(entry.path())
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::debug!(name = ?raw, "Skipping non UTF-8 entry"),
            }
        }

        Ok(names)
    }

    async fn is_available(&self) -> bool {
        fs::read_dir(&self.root).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;
    use tokio_util::io::StreamReader;

    async fn read_all(object: VideoObject) -> Vec<u8> {
        let mut data = Vec::new();
        let mut file = object.file;
        file.read_to_end(&mut data).await.unwrap();
        data
    }

    #[tokio::test]
    async fn test_new_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("uploads");
        assert!(!root.exists());

        let storage = LocalVideoStorage::new(&root).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(storage.root(), root.as_path());
        assert!(storage.is_available().await);
    }

    #[tokio::test]
    async fn test_save_open_and_overwrite() {
        let dir = tempdir().unwrap();
        let storage = LocalVideoStorage::new(dir.path()).await.unwrap();

        let written = storage
            .save_stream("clip.mp4", Box::new(&b"first"[..]))
            .await
            .unwrap();
        assert_eq!(written, 5);

        storage
            .save_stream("clip.mp4", Box::new(&b"second!"[..]))
            .await
            .unwrap();

        let object = storage.open("clip.mp4").await.unwrap();
        assert_eq!(object.size, 7);
        assert!(object.modified.is_some());
        assert_eq!(read_all(object).await, b"second!");
        assert_eq!(storage.list().await.unwrap(), vec!["clip.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let storage = LocalVideoStorage::new(dir.path()).await.unwrap();

        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ]);
        let result = storage
            .save_stream("broken.mp4", Box::new(StreamReader::new(chunks)))
            .await;

        assert!(matches!(result, Err(StorageError::Source(_))));
        assert!(matches!(
            storage.open("broken.mp4").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_and_directories() {
        let dir = tempdir().unwrap();
        let storage = LocalVideoStorage::new(dir.path()).await.unwrap();
        std::fs::create_dir(dir.path().join("folder.mp4")).unwrap();

        assert!(matches!(
            storage.open("missing.mp4").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.open("folder.mp4").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_keys_outside_root() {
        let dir = tempdir().unwrap();
        let storage = LocalVideoStorage::new(dir.path().join("uploads")).await.unwrap();
        std::fs::write(dir.path().join("secret.mp4"), b"secret").unwrap();

        assert!(matches!(
            storage.open("../secret.mp4").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.save_stream("../escape.mp4", Box::new(&b"x"[..])).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(!dir.path().join("escape.mp4").exists());
    }

    #[tokio::test]
    async fn test_list_reports_unavailable_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("uploads");
        let storage = LocalVideoStorage::new(&root).await.unwrap();
        std::fs::remove_dir(&root).unwrap();

        assert!(matches!(storage.list().await, Err(StorageError::Unavailable(_))));
        assert!(!storage.is_available().await);
    }
}
