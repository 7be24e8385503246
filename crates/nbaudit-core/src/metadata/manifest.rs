use std::path::{Path, PathBuf};

use tracing::debug;

/// The manifest file name.
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Failure reading or parsing the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// IO error reading the manifest.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Invalid TOML.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Reads `pyproject.toml` under `root`. `Ok(None)` when the file is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_manifest(root: &Path) -> Result<Option<toml::Table>, ManifestError> {
    let path = root.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| ManifestError::Io {
        path: path.clone(),
        source: e,
    })?;
    content
        .parse::<toml::Table>()
        .map(Some)
        .map_err(|e| ManifestError::Parse {
            path,
            message: e.to_string(),
        })
}

/// `[project].version` from the manifest, if present and a string.
#[must_use]
pub fn manifest_version(root: &Path) -> Option<String> {
    match read_manifest(root) {
        Ok(Some(table)) => table
            .get("project")
            .and_then(|p| p.get("version"))
            .and_then(toml::Value::as_str)
            .map(str::to_owned),
        Ok(None) => {
            debug!("No {MANIFEST_FILE} under {}", root.display());
            None
        }
        Err(e) => {
            debug!("{e}");
            None
        }
    }
}
