//! Lectern Artifact Store
//!
//! Key-addressed blob storage for uploaded inputs and produced artifacts.
//! The api only checks that an input exists; the worker downloads inputs,
//! uploads artifacts under `outputs/{job_id}/...` and presigns them.

mod factory;
mod object;

pub use factory::{StoreKind, open_store};
pub use object::ObjectArtifactStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Blob store contract used by the services
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `key`, returning the key
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Fetch the bytes stored under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether an object exists under `key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Time-limited download URL for `key`
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String>;
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by artifact stores
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("presign failed: {0}")]
    PresignFailed(String),

    #[error("store configuration error: {0}")]
    Config(String),
}

/// Key under which a job's artifact is stored
pub fn output_key(job_id: impl std::fmt::Display, file_name: &str) -> String {
    format!("outputs/{}/{}", job_id, file_name)
}
