//! Package identity and version resolution.
//!
//! The resolver never fails: anything missing or malformed degrades to an
//! absent value and is logged at `debug`. Checks decide how severe absence is.
//!
//! Version sources are tried in this order, first match wins:
//!
//! 1. `__version__ = "..."` at the top level of `<package>/__init__.py`
//! 2. `from .version import __version__` (or `_version`), read from that file
//! 3. an `importlib.metadata` lookup in `__init__.py`, deferring the value to
//!    the manifest
//! 4. `[project].version` in `pyproject.toml`
//!
//! The changelog version is extracted separately and is never authoritative.

mod changelog;
mod manifest;
mod package_dir;
mod version;

use std::path::{Path, PathBuf};

use tracing::debug;

pub use changelog::{
    changelog_version, find_changelog, version_entries, ChangelogEntry, CHANGELOG_CANDIDATES,
};
pub use manifest::{manifest_version, read_manifest, ManifestError, MANIFEST_FILE};
pub use package_dir::{find_package_dir, ENTRY_POINT, PACKAGE_PREFIX};
pub use version::{resolve_version, uses_dynamic_lookup, VersionCandidate, VersionOrigin};

/// Everything the resolver learned about a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// The discovered `netbox_*` directory.
    pub package_dir: Option<PathBuf>,
    /// Authoritative version and where it came from.
    pub version: VersionCandidate,
    /// Version found in the package source itself (direct or indirect).
    pub module_version: Option<String>,
    /// `[project].version` from the manifest.
    pub manifest_version: Option<String>,
    /// Latest released version in the changelog.
    pub changelog_version: Option<String>,
}

impl PackageMetadata {
    /// Name of the package directory.
    #[must_use]
    pub fn package_name(&self) -> Option<&str> {
        self.package_dir
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }

    /// Returns true if the package reads its version from installed metadata.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.version.origin == VersionOrigin::DynamicMetadataLookup
    }
}

/// Resolves package directory, version and cross-check versions for `root`.
#[must_use]
pub fn resolve(root: &Path) -> PackageMetadata {
    resolve_in(root, find_package_dir(root))
}

/// Like [`resolve`], but reads the version from an already chosen package
/// directory instead of discovering one.
#[must_use]
pub fn resolve_in(root: &Path, package_dir: Option<PathBuf>) -> PackageMetadata {
    let (version, module_version) = resolve_version(root, package_dir.as_deref());
    let manifest_version = manifest_version(root);
    let changelog_version = changelog_version(root);

    debug!(
        "Resolved metadata for {}: version={:?} ({:?}), changelog={:?}",
        root.display(),
        version.value,
        version.origin,
        changelog_version
    );

    PackageMetadata {
        package_dir,
        version,
        module_version,
        manifest_version,
        changelog_version,
    }
}
