use std::path::{Path, PathBuf};

use persona_common::{
    error::{PersonaError, Result},
    types::Session,
};
use tokio::fs;

/// Persists the logged-in session as a JSON file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<Session>> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                let session = serde_json::from_slice(&bytes).map_err(|err| {
                    PersonaError::InternalError(format!(
                        "failed to parse session file {}: {err}",
                        self.path.display()
                    ))
                })?;
                Ok(Some(session))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersonaError::Io(err)),
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let payload = serde_json::to_vec_pretty(session).map_err(|err| {
            PersonaError::InternalError(format!("failed to serialize session: {err}"))
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload).await?;
        restrict_permissions(&tmp_path).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersonaError::Io(err)),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
