use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DocgenError, Result};

/// Write `content` to `directory/filename`, replacing whatever was there.
///
/// The directory must already exist; it is never created here.
pub fn write(directory: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let path = directory.join(filename);
    fs::write(&path, content).map_err(|source| DocgenError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = content.len(), "Wrote file");
    Ok(path)
}
