use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Errors raised by the document store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found at {0}")]
    NotFound(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// The on-disk snapshot of one room's text.
///
/// Writes go to a sibling temporary file that is synced and then renamed over
/// the target, so a reader sees either the previous or the new snapshot.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full current text
    pub async fn read(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// Read the full current text, treating a never-written document as empty
    pub async fn read_or_empty(&self) -> Result<String, StoreError> {
        match self.read().await {
            Ok(text) => Ok(text),
            Err(StoreError::NotFound(_)) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Replace the full text
    pub async fn write(&self, text: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp_path = self.tmp_path();
        if let Err(e) = self.write_tmp(&tmp_path, text).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::io(&self.path, e));
        }

        debug!(path = %self.path.display(), bytes = text.len(), "Document snapshot written");
        Ok(())
    }

    async fn write_tmp(&self, tmp_path: &Path, text: &str) -> Result<(), StoreError> {
        let mut file = fs::File::create(tmp_path)
            .await
            .map_err(|e| StoreError::io(tmp_path, e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| StoreError::io(tmp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::io(tmp_path, e))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }
}
