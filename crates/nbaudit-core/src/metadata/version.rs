use std::path::Path;

use nbaudit_python::{parse_module, Module};
use tracing::debug;

use super::manifest::manifest_version;
use super::package_dir::ENTRY_POINT;

const VERSION_ATTR: &str = "__version__";

/// Sibling modules that may hold `__version__`.
const VERSION_MODULES: &[&str] = &["version", "_version"];

/// Text patterns that show the version is read from installed metadata.
const DYNAMIC_PATTERNS: &[&str] = &[
    "importlib.metadata",
    "importlib import metadata",
    "importlib_metadata",
];

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrigin {
    /// `__version__ = "..."` in the entry point.
    DirectConstant,
    /// `__version__` imported from a sibling version module.
    IndirectModuleImport,
    /// Read from installed metadata at runtime; the value comes from the manifest.
    DynamicMetadataLookup,
    /// `[project].version` in the manifest.
    ManifestDeclaration,
    /// No source declared a version.
    Absent,
}

/// A version value and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCandidate {
    /// The version string, if known.
    pub value: Option<String>,
    /// Which rule produced it.
    pub origin: VersionOrigin,
}

impl VersionCandidate {
    fn new(value: Option<String>, origin: VersionOrigin) -> Self {
        Self { value, origin }
    }

    /// No version anywhere.
    #[must_use]
    pub fn absent() -> Self {
        Self::new(None, VersionOrigin::Absent)
    }
}

/// Returns true if `source` mentions a metadata lookup facility.
#[must_use]
pub fn uses_dynamic_lookup(source: &str) -> bool {
    DYNAMIC_PATTERNS.iter().any(|p| source.contains(p))
}

/// Applies the precedence chain. Returns the authoritative candidate and the
/// version declared in the package source itself, if any.
#[must_use]
pub fn resolve_version(
    root: &Path,
    package_dir: Option<&Path>,
) -> (VersionCandidate, Option<String>) {
    if let Some(dir) = package_dir {
        if let Some(found) = resolve_from_package(root, dir) {
            return found;
        }
    }

    match manifest_version(root) {
        Some(v) => (
            VersionCandidate::new(Some(v), VersionOrigin::ManifestDeclaration),
            None,
        ),
        None => (VersionCandidate::absent(), None),
    }
}

fn resolve_from_package(
    root: &Path,
    dir: &Path,
) -> Option<(VersionCandidate, Option<String>)> {
    let init = dir.join(ENTRY_POINT);
    let source = std::fs::read_to_string(&init)
        .map_err(|e| debug!("Cannot read {}: {}", init.display(), e))
        .ok()?;
    let module = parse_module(&source)
        .map_err(|e| debug!("Cannot parse {}: {}", init.display(), e))
        .ok()?;

    if let Some(v) = module.string_constant(VERSION_ATTR) {
        return Some((
            VersionCandidate::new(Some(v.to_owned()), VersionOrigin::DirectConstant),
            Some(v.to_owned()),
        ));
    }

    if let Some(v) = indirect_version(&module, dir) {
        return Some((
            VersionCandidate::new(Some(v.clone()), VersionOrigin::IndirectModuleImport),
            Some(v),
        ));
    }

    if uses_dynamic_lookup(&source) {
        return Some((
            VersionCandidate::new(manifest_version(root), VersionOrigin::DynamicMetadataLookup),
            None,
        ));
    }

    None
}

/// Follows `from .version import __version__` style imports.
fn indirect_version(module: &Module, dir: &Path) -> Option<String> {
    let package = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    for stmt in module.module_level() {
        let nbaudit_python::Stmt::ImportFrom(import) = stmt else {
            continue;
        };
        if !import.imports(VERSION_ATTR) {
            continue;
        }
        let Some(leaf) = import.module_leaf() else {
            continue;
        };
        if !VERSION_MODULES.contains(&leaf) {
            continue;
        }
        let qualified = import.level > 0
            || import.module.as_deref() == Some(format!("{package}.{leaf}").as_str());
        if !qualified {
            continue;
        }

        let path = dir.join(format!("{leaf}.py"));
        let found = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| parse_module(&s).ok())
            .and_then(|m| m.string_constant(VERSION_ATTR).map(str::to_owned));
        if found.is_some() {
            return found;
        }
        debug!("{} has no literal {VERSION_ATTR}", path.display());
    }
    None
}
