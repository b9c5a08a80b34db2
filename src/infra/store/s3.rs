use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use super::{Area, ArtifactStore, validate_name};
use crate::error::{RaterError, Result};

/// Stores artifacts as objects in an S3 bucket.
///
/// Keys are `<prefix>/<area>/<name>`, or `<area>/<name>` with an empty prefix.
/// A failed `PutObject` leaves no object behind.
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3ArtifactStore {
    /// Creates a store using the ambient AWS configuration already loaded by
    /// `aws_config::load_from_env`.
    pub fn new(config: &aws_config::SdkConfig, bucket: &str, prefix: &str) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }
}

fn object_key(prefix: &str, area: Area, name: &str) -> String {
    if prefix.is_empty() {
        format!("{}/{}", area.dir_name(), name)
    } else {
        format!("{}/{}/{}", prefix, area.dir_name(), name)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, area: Area, name: &str, bytes: &[u8]) -> Result<()> {
        let key = object_key(&self.prefix, area, validate_name(name)?);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type("text/csv")
            .send()
            .await
            .map_err(|e| {
                RaterError::Storage(format!(
                    "S3 PutObject failed for '{key}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(bucket = %self.bucket, key = %key, bytes = bytes.len(), "Artifact uploaded");
        Ok(())
    }

    async fn get(&self, area: Area, name: &str) -> Result<Vec<u8>> {
        let name = validate_name(name)?;
        let key = object_key(&self.prefix, area, name);

        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    RaterError::NotFound(name.to_string())
                } else {
                    RaterError::Storage(format!(
                        "S3 GetObject failed for '{key}': {}",
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| RaterError::Storage(format!("reading S3 object '{key}': {e}")))?;

        Ok(body.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_without_prefix() {
        assert_eq!(object_key("", Area::Uploads, "a.csv"), "uploads/a.csv");
        assert_eq!(object_key("", Area::Outputs, "result_a.csv"), "output/result_a.csv");
    }

    #[test]
    fn test_object_key_with_prefix() {
        assert_eq!(object_key("rater/prod", Area::Outputs, "r.csv"), "rater/prod/output/r.csv");
    }
}
