//! Context passed to every check.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::metadata::{self, PackageMetadata};

/// Directories never descended into when collecting sources.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "venv",
    "env",
    "node_modules",
    "__pycache__",
    "build",
    "dist",
    ".tox",
];

/// What a check knows about the audited tree.
#[derive(Debug, Clone)]
pub struct AuditContext {
    /// Root of the plugin source tree.
    pub root: PathBuf,
    /// The audited `netbox_*` package directory, if any.
    pub package_dir: Option<PathBuf>,
    /// Version and identity resolved once against `package_dir`.
    pub metadata: PackageMetadata,
}

impl AuditContext {
    /// Creates a new context, resolving metadata for `package_dir`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, package_dir: Option<PathBuf>) -> Self {
        let root = root.into();
        let metadata = metadata::resolve_in(&root, package_dir.clone());
        Self {
            root,
            package_dir,
            metadata,
        }
    }

    /// Path relative to the root.
    #[must_use]
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Returns true if `relative` exists under the root.
    #[must_use]
    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).exists()
    }

    /// Returns true if `relative` is a regular file under the root.
    #[must_use]
    pub fn is_file(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).is_file()
    }

    /// Returns true if `relative` is a directory under the root.
    #[must_use]
    pub fn is_dir(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).is_dir()
    }

    /// Reads a text file under the root; `None` if missing or unreadable.
    #[must_use]
    pub fn read(&self, relative: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.path(relative)).ok()
    }

    /// Name of the package directory (e.g. `netbox_demo`).
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        self.package_dir
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }

    /// Path inside the package directory.
    #[must_use]
    pub fn package_path(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        self.package_dir.as_ref().map(|p| p.join(relative))
    }

    /// All `.py` files under `dir`, sorted, skipping virtualenvs, caches and
    /// build output.
    #[must_use]
    pub fn python_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && e.file_name()
                            .to_str()
                            .is_some_and(|n| SKIPPED_DIRS.contains(&n)))
            })
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
            .collect();
        files.sort();
        files
    }

    /// Path relative to the root, for messages.
    #[must_use]
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
