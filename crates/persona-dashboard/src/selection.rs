use std::path::Path;

use persona_common::{
    error::{PersonaError, Result},
    types::SelectedFile,
};
use tracing::debug;
use walkdir::WalkDir;

/// Lists every regular file under `root`, subfolders included, ordered by path.
///
/// Nothing is filtered here: a folder with stray non-image files must still
/// surface as a mixed selection.
pub async fn scan_folder(root: impl AsRef<Path>) -> Result<Vec<SelectedFile>> {
    let root = root.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || scan_folder_blocking(&root))
        .await
        .map_err(|err| PersonaError::InternalError(format!("folder scan task failed: {err}")))?
}

fn scan_folder_blocking(root: &Path) -> Result<Vec<SelectedFile>> {
    if !root.is_dir() {
        return Err(PersonaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a folder", root.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata().map_err(std::io::Error::from)?.len();
        files.push(SelectedFile::new(entry.into_path(), size));
    }

    debug!(root = %root.display(), files = files.len(), "scanned folder");
    Ok(files)
}
