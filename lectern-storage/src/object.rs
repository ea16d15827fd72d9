use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};

use crate::{ArtifactStore, Result, StorageError};

/// [`ArtifactStore`] backed by any `object_store` implementation
///
/// S3 buckets get real presigned URLs. Backends that cannot sign (memory,
/// local filesystem) return a plain locator built from `url_prefix`.
pub struct ObjectArtifactStore {
    inner: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
    url_prefix: String,
    content_types: bool,
}

impl ObjectArtifactStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            signer: None,
            url_prefix: "memory://".to_string(),
            content_types: true,
        }
    }

    pub fn local(base_path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_path).map_err(|e| StorageError::Config(e.to_string()))?;
        let fs = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(fs),
            signer: None,
            url_prefix: format!("file://{}/", base_path.display()),
            // LocalFileSystem rejects object attributes
            content_types: false,
        })
    }

    /// S3 bucket; credentials and region come from the standard `AWS_*` variables
    pub fn s3(bucket: &str) -> Result<Self> {
        let s3 = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;
        let s3 = Arc::new(s3);

        Ok(Self {
            inner: s3.clone(),
            signer: Some(s3),
            url_prefix: format!("s3://{}/", bucket),
            content_types: true,
        })
    }
}

fn parse_key(key: &str) -> Result<StorePath> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty".to_string(),
        });
    }
    StorePath::parse(key).map_err(|e| StorageError::InvalidKey {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ArtifactStore for ObjectArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let path = parse_key(key)?;
        let size = bytes.len();

        let mut attributes = Attributes::new();
        if self.content_types {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.inner
            .put_opts(&path, PutPayload::from(bytes), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!("Stored {} bytes at {}", size, key);
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = parse_key(key)?;
        let result = self.inner.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!("Fetched {} bytes from {}", bytes.len(), key);
        Ok(bytes.to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = parse_key(key)?;
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::DownloadFailed(e.to_string())),
        }
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        let path = parse_key(key)?;
        match &self.signer {
            Some(signer) => {
                let url = signer
                    .signed_url(http::Method::GET, &path, ttl)
                    .await
                    .map_err(|e| StorageError::PresignFailed(e.to_string()))?;
                tracing::debug!("Presigned {} for {:?}", key, ttl);
                Ok(url.to_string())
            }
            None => Ok(format!("{}{}", self.url_prefix, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_in_memory() {
        let store = ObjectArtifactStore::in_memory();
        let key = store
            .put("uploads/f.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(key, "uploads/f.pdf");
        assert_eq!(store.get("uploads/f.pdf").await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_exists_reports_missing_objects() {
        let store = ObjectArtifactStore::in_memory();
        assert!(!store.exists("uploads/missing.pdf").await.unwrap());

        store
            .put("uploads/present.pdf", vec![1, 2, 3], "application/pdf")
            .await
            .unwrap();
        assert!(store.exists("uploads/present.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = ObjectArtifactStore::in_memory();
        let err = store.get("nope.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let store = ObjectArtifactStore::in_memory();
        assert!(matches!(
            store.exists("").await,
            Err(StorageError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.put("a/../b", vec![], "text/plain").await,
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_presign_without_signer_uses_locator() {
        let store = ObjectArtifactStore::in_memory();
        let url = store
            .presign("outputs/j1/summary.json", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(url, "memory://outputs/j1/summary.json");
    }
}
