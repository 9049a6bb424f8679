// Blob storage behind a URL-returning trait. The disk implementation mirrors
// the original upload layout: millisecond-timestamp filenames under a public
// uploads directory.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use crate::common::error::AppError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes and returns the public URL path to serve them from.
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, AppError>;
}

pub struct DiskBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl DiskBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(anyhow::Error::from)?;
        let filename = format!(
            "{}.{}",
            Utc::now().timestamp_millis(),
            extension.trim_start_matches('.')
        );
        tokio::fs::write(self.root.join(&filename), bytes)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(format!(
            "{}/{}",
            self.public_prefix.trim_end_matches('/'),
            filename
        ))
    }
}
