//! Uploaded image bytes.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use aurora_core::ImageId;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image not found")]
    NotFound,

    #[error("image storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image storage unavailable")]
    Unavailable,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, id: ImageId, bytes: Vec<u8>) -> Result<(), ImageStoreError>;
    async fn load(&self, id: ImageId) -> Result<Vec<u8>, ImageStoreError>;
}

/// Keeps images in process memory. Used when no upload directory is configured.
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    inner: RwLock<HashMap<ImageId, Vec<u8>>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(&self, id: ImageId, bytes: Vec<u8>) -> Result<(), ImageStoreError> {
        let mut map = self.inner.write().map_err(|_| ImageStoreError::Unavailable)?;
        map.insert(id, bytes);
        Ok(())
    }

    async fn load(&self, id: ImageId) -> Result<Vec<u8>, ImageStoreError> {
        let map = self.inner.read().map_err(|_| ImageStoreError::Unavailable)?;
        map.get(&id).cloned().ok_or(ImageStoreError::NotFound)
    }
}

/// Stores each image as `<root>/<image id>` on local disk.
#[derive(Debug, Clone)]
pub struct LocalDiskImageStore {
    root: PathBuf,
}

impl LocalDiskImageStore {
    /// Create the store, creating `root` if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, ImageStoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, id: ImageId) -> PathBuf {
        self.root.join(id.to_string())
    }
}

#[async_trait]
impl ImageStore for LocalDiskImageStore {
    async fn save(&self, id: ImageId, bytes: Vec<u8>) -> Result<(), ImageStoreError> {
        tokio::fs::write(self.path_for(id), bytes).await?;
        Ok(())
    }

    async fn load(&self, id: ImageId) -> Result<Vec<u8>, ImageStoreError> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ImageStoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
