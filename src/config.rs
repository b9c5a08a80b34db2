//! Process configuration.
//!
//! Built once at start-up from the environment (after `.env` is loaded) or
//! from a JSON file, then handed by value to the components that need it.
//!
//! ```json
//! {
//!   "store": { "backend": "local", "upload_dir": "uploads", "output_dir": "output" },
//!   "roles": { "identity": ["学号", "姓名"], "metadata": ["专业"] },
//!   "average_column": "加权平均分"
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analyzers::types::ColumnRoles;
use crate::analyzers::weighted::DEFAULT_AVERAGE_COLUMN;
use crate::error::Result;

/// Where uploaded sheets and computed results are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Local {
        upload_dir: PathBuf,
        output_dir: PathBuf,
    },
    S3 {
        bucket: String,
        #[serde(default)]
        prefix: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Local {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl StoreConfig {
    /// Reads `RATER_S3_BUCKET` / `RATER_S3_PREFIX`, falling back to the local
    /// directories `RATER_UPLOAD_DIR` and `RATER_OUTPUT_DIR`.
    pub fn from_env() -> Self {
        if let Some(bucket) = non_empty_var("RATER_S3_BUCKET") {
            return StoreConfig::S3 {
                bucket,
                prefix: non_empty_var("RATER_S3_PREFIX").unwrap_or_default(),
            };
        }

        StoreConfig::Local {
            upload_dir: non_empty_var("RATER_UPLOAD_DIR")
                .unwrap_or_else(|| "uploads".to_string())
                .into(),
            output_dir: non_empty_var("RATER_OUTPUT_DIR")
                .unwrap_or_else(|| "output".to_string())
                .into(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaterConfig {
    pub store: StoreConfig,
    pub roles: ColumnRoles,
    pub average_column: String,
}

impl Default for RaterConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            roles: ColumnRoles::default(),
            average_column: DEFAULT_AVERAGE_COLUMN.to_string(),
        }
    }
}

impl RaterConfig {
    pub fn from_env() -> Self {
        Self {
            store: StoreConfig::from_env(),
            ..Default::default()
        }
    }

    /// Switches the store to the S3 `bucket`.
    ///
    /// A prefix already configured for S3 is kept; otherwise it comes from
    /// `RATER_S3_PREFIX`.
    pub fn with_bucket(mut self, bucket: String) -> Self {
        let prefix = match self.store {
            StoreConfig::S3 { prefix, .. } => prefix,
            StoreConfig::Local { .. } => non_empty_var("RATER_S3_PREFIX").unwrap_or_default(),
        };
        self.store = StoreConfig::S3 { bucket, prefix };
        self
    }

    /// Loads the config from a JSON file at `path`. Missing fields take defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_local() {
        let config = RaterConfig::default();
        assert_eq!(
            config.store,
            StoreConfig::Local {
                upload_dir: "uploads".into(),
                output_dir: "output".into(),
            }
        );
        assert_eq!(config.average_column, "weighted_average");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"store": {{"backend": "s3", "bucket": "grades"}}, "average_column": "加权平均分"}}"#
        )
        .unwrap();

        let config = RaterConfig::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(
            config.store,
            StoreConfig::S3 {
                bucket: "grades".into(),
                prefix: String::new(),
            }
        );
        assert_eq!(config.average_column, "加权平均分");
        assert_eq!(config.roles, ColumnRoles::default());
    }

    #[test]
    fn test_with_bucket_keeps_configured_prefix() {
        let config = RaterConfig {
            store: StoreConfig::S3 {
                bucket: "grades".into(),
                prefix: "term/2024".into(),
            },
            ..Default::default()
        };

        assert_eq!(
            config.with_bucket("other".into()).store,
            StoreConfig::S3 {
                bucket: "other".into(),
                prefix: "term/2024".into(),
            }
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(RaterConfig::load("/nonexistent/rater.json").is_err());
    }
}
