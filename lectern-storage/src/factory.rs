use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::{ArtifactStore, ObjectArtifactStore, Result, StorageError};

/// Which backend to open, parsed from `ARTIFACT_STORE`
///
/// Accepted forms: `memory`, `local:<path>`, `s3:<bucket>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Local(PathBuf),
    S3 { bucket: String },
}

impl FromStr for StoreKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "memory" {
            return Ok(StoreKind::Memory);
        }
        match s.split_once(':') {
            Some(("local", path)) if !path.is_empty() => Ok(StoreKind::Local(PathBuf::from(path))),
            Some(("s3", bucket)) if !bucket.is_empty() => Ok(StoreKind::S3 {
                bucket: bucket.to_string(),
            }),
            _ => Err(StorageError::Config(format!(
                "unsupported artifact store '{}' (expected memory, local:<path> or s3:<bucket>)",
                s
            ))),
        }
    }
}

/// Open the configured store
pub fn open_store(kind: &StoreKind) -> Result<Arc<dyn ArtifactStore>> {
    let store = match kind {
        StoreKind::Memory => ObjectArtifactStore::in_memory(),
        StoreKind::Local(path) => ObjectArtifactStore::local(path.clone())?,
        StoreKind::S3 { bucket } => ObjectArtifactStore::s3(bucket)?,
    };
    tracing::info!("Artifact store opened: {:?}", kind);
    Ok(Arc::new(store))
}
