use std::path::{Path, PathBuf};

use bytes::Bytes;
use persona_common::{config::RESULT_FILE_NAME, error::Result};
use tokio::fs;
use tracing::info;

/// The downloaded result archive, held in memory until the user saves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Bytes,
    file_name: String,
}

impl Artifact {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writes the archive into `dir` under its suggested name and returns the path.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let path = dir.join(&self.file_name);
        let tmp_path = path.with_extension("part");
        fs::write(&tmp_path, &self.bytes).await?;
        fs::rename(&tmp_path, &path).await?;

        info!(path = %path.display(), bytes = self.bytes.len(), "result saved");
        Ok(path)
    }
}

/// Wraps fetched result bytes. The contents are passed through untouched.
#[derive(Debug, Clone)]
pub struct ResultPresenter {
    file_name: String,
}

impl ResultPresenter {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn present(&self, bytes: Bytes) -> Artifact {
        Artifact {
            bytes,
            file_name: self.file_name.clone(),
        }
    }
}

impl Default for ResultPresenter {
    fn default() -> Self {
        Self::new(RESULT_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::ResultPresenter;

    #[test]
    fn artifact_uses_fixed_file_name() {
        let artifact = ResultPresenter::default().present(Bytes::from_static(b"PK"));
        assert_eq!(artifact.file_name(), "categorized_images.zip");
        assert_eq!(artifact.len(), 2);
    }

    #[tokio::test]
    async fn save_writes_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ResultPresenter::default().present(Bytes::from_static(b"not even a zip"));

        let path = artifact.save(dir.path().join("out")).await.unwrap();
        assert_eq!(path, dir.path().join("out").join("categorized_images.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"not even a zip");
        assert!(!path.with_extension("part").exists());
    }

    #[tokio::test]
    async fn save_replaces_previous_download() {
        let dir = tempfile::tempdir().unwrap();
        let presenter = ResultPresenter::default();
        presenter
            .present(Bytes::from_static(b"old"))
            .save(dir.path())
            .await
            .unwrap();

        let path = presenter
            .present(Bytes::from_static(b"new"))
            .save(dir.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }
}
