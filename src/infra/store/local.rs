use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Area, ArtifactStore, validate_name};
use crate::error::{RaterError, Result};

/// Stores artifacts as files in an upload directory and an output directory.
pub struct LocalArtifactStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl LocalArtifactStore {
    /// Creates both directories if they do not exist yet.
    pub fn new(upload_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<Self> {
        let upload_dir = upload_dir.as_ref().to_path_buf();
        let output_dir = output_dir.as_ref().to_path_buf();

        fs::create_dir_all(&upload_dir)?;
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            upload_dir,
            output_dir,
        })
    }

    fn dir(&self, area: Area) -> &Path {
        match area {
            Area::Uploads => &self.upload_dir,
            Area::Outputs => &self.output_dir,
        }
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalArtifactStore {
    /// Writes to a hidden temp file, then renames it into place.
    async fn put(&self, area: Area, name: &str, bytes: &[u8]) -> Result<()> {
        let name = validate_name(name)?;
        let dir = self.dir(area);
        let tmp_path = dir.join(format!(".{name}.tmp"));
        let final_path = dir.join(name);

        if let Err(e) = fs::write(&tmp_path, bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        fs::rename(&tmp_path, &final_path)?;

        debug!(path = %final_path.display(), bytes = bytes.len(), "Artifact written");
        Ok(())
    }

    async fn get(&self, area: Area, name: &str) -> Result<Vec<u8>> {
        let name = validate_name(name)?;
        let path = self.dir(area).join(name);

        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RaterError::NotFound(name.to_string()),
            _ => e.into(),
        })
    }
}
