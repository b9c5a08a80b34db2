//! Artifact storage for uploaded sheets and computed results.
//!
//! [`ArtifactStore`] is the async trait the rater reads and writes through.
//! [`LocalArtifactStore`] keeps artifacts in two directories on disk.
//! [`S3ArtifactStore`] keeps them under two key prefixes in an S3 bucket.

mod local;
mod s3;

pub use local::LocalArtifactStore;
pub use s3::S3ArtifactStore;

use crate::config::StoreConfig;
use crate::error::{RaterError, Result};

/// The two separate namespaces an artifact can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Uploads,
    Outputs,
}

impl Area {
    pub fn dir_name(self) -> &'static str {
        match self {
            Area::Uploads => "uploads",
            Area::Outputs => "output",
        }
    }
}

/// Byte storage keyed by `(area, name)`.
///
/// `put` must not leave a readable artifact behind when it fails.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, area: Area, name: &str, bytes: &[u8]) -> Result<()>;

    /// Returns [`RaterError::NotFound`] when nothing is stored under `name`.
    async fn get(&self, area: Area, name: &str) -> Result<Vec<u8>>;
}

/// Builds the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn ArtifactStore>> {
    match config {
        StoreConfig::Local {
            upload_dir,
            output_dir,
        } => Ok(Box::new(LocalArtifactStore::new(upload_dir, output_dir)?)),
        StoreConfig::S3 { bucket, prefix } => {
            let sdk_config = aws_config::load_from_env().await;
            Ok(Box::new(S3ArtifactStore::new(&sdk_config, bucket, prefix)))
        }
    }
}

/// Rejects names that could escape their area: empty names, path
/// separators, `.`/`..`, and NUL bytes.
pub fn validate_name(name: &str) -> Result<&str> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if bad {
        Err(RaterError::InvalidName(name.to_string()))
    } else {
        Ok(name)
    }
}
