use std::path::{Path, PathBuf};

use tracing::debug;

/// Directory prefix every NetBox plugin package uses.
pub const PACKAGE_PREFIX: &str = "netbox_";

/// Entry-point file that marks a directory as a package.
pub const ENTRY_POINT: &str = "__init__.py";

/// Finds the first `netbox_*` directory (lexicographic order) that contains
/// `__init__.py`.
#[must_use]
pub fn find_package_dir(root: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", root.display(), e);
            return None;
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.starts_with(PACKAGE_PREFIX))
        .collect();
    names.sort();

    let found = names
        .into_iter()
        .map(|n| root.join(n))
        .find(|p| p.is_dir() && p.join(ENTRY_POINT).is_file());

    match &found {
        Some(dir) => debug!("Package directory: {}", dir.display()),
        None => debug!("No {PACKAGE_PREFIX}* package under {}", root.display()),
    }
    found
}
