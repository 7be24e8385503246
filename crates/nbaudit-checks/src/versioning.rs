//! Check that the package, manifest and changelog agree on the version.

use std::sync::LazyLock;

use nbaudit_core::metadata::{PackageMetadata, VersionOrigin};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use regex::Regex;

use crate::util::regex;

/// Check name for versioning.
pub const NAME: &str = "versioning";

static SEMVER: LazyLock<Regex> = LazyLock::new(|| regex(r"^\d+\.\d+\.\d+$"));

/// Validates the resolved version and its consistency across sources.
#[derive(Debug, Clone, Default)]
pub struct Versioning;

impl Versioning {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Versioning {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Versioning"
    }

    fn tag(&self) -> &'static str {
        "V"
    }

    fn description(&self) -> &'static str {
        "Semver, __init__.py/pyproject.toml agreement and CHANGELOG latest version"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        if ctx.package_dir.is_none() {
            cat.error("package", "No package directory");
            return Ok(cat);
        }

        let meta = &ctx.metadata;
        check_semver(&mut cat, meta);
        check_manifest_agreement(&mut cat, meta);
        check_changelog_agreement(&mut cat, meta);

        Ok(cat)
    }
}

fn source_label(origin: VersionOrigin) -> &'static str {
    match origin {
        VersionOrigin::DirectConstant => "__init__.py",
        VersionOrigin::IndirectModuleImport => "version module",
        VersionOrigin::DynamicMetadataLookup => "pyproject.toml via importlib.metadata",
        VersionOrigin::ManifestDeclaration => "pyproject.toml",
        VersionOrigin::Absent => "nowhere",
    }
}

fn check_semver(cat: &mut CategoryResult, meta: &PackageMetadata) {
    let origin = meta.version.origin;
    let Some(version) = meta.version.value.as_deref() else {
        cat.error("semver", "__version__ not found in __init__.py");
        return;
    };

    let label = source_label(origin);
    if SEMVER.is_match(version) {
        cat.pass(
            "semver",
            format!("Version is valid semver: {version} (from {label})"),
        );
    } else {
        cat.warn(
            "semver",
            format!("Version may not be semver: {version} (from {label})"),
        );
    }

    if origin == VersionOrigin::ManifestDeclaration {
        cat.warn(
            "version_source",
            "Package does not declare __version__; only pyproject.toml has a version",
        );
    }
}

fn check_manifest_agreement(cat: &mut CategoryResult, meta: &PackageMetadata) {
    let Some(manifest) = meta.manifest_version.as_deref() else {
        cat.error("pyproject_match", "No version in pyproject.toml");
        return;
    };

    if meta.is_dynamic() {
        cat.pass(
            "pyproject_match",
            format!("pyproject.toml is the single source of truth ({manifest})"),
        );
        return;
    }

    if let Some(module) = meta.module_version.as_deref() {
        if module == manifest {
            cat.pass(
                "pyproject_match",
                format!("pyproject.toml version matches ({manifest})"),
            );
        } else {
            cat.error(
                "pyproject_match",
                format!("Version mismatch: __init__.py={module}, pyproject.toml={manifest}"),
            );
        }
    }
}

fn check_changelog_agreement(cat: &mut CategoryResult, meta: &PackageMetadata) {
    let Some(changelog) = meta.changelog_version.as_deref() else {
        cat.info("changelog_match", "No version found in CHANGELOG.md");
        return;
    };
    let Some(version) = meta.version.value.as_deref() else {
        return;
    };
    if changelog == version {
        cat.pass(
            "changelog_match",
            format!("CHANGELOG latest version matches ({changelog})"),
        );
    } else {
        cat.warn(
            "changelog_match",
            format!("CHANGELOG latest ({changelog}) != __version__ ({version})"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use nbaudit_core::{CheckRunner, Severity};

    fn manifest(version: &str) -> String {
        format!("[project]\nname = \"netbox-demo\"\nversion = \"{version}\"\n")
    }

    #[test]
    fn direct_constant_mismatch_is_an_error() {
        let pyproject = manifest("1.2.0");
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", "__version__ = \"1.2.3\"\n"),
            ("pyproject.toml", pyproject.as_str()),
            ("CHANGELOG.md", "## [1.2.3] - 2025-02-01\n"),
        ]);
        let cat = Versioning::new().run(&ctx).unwrap();
        assert_eq!(
            cat.get("semver").unwrap().message,
            "Version is valid semver: 1.2.3 (from __init__.py)"
        );
        let mismatch = cat.get("pyproject_match").unwrap();
        assert_eq!(mismatch.severity, Severity::Error);
        assert_eq!(
            mismatch.message,
            "Version mismatch: __init__.py=1.2.3, pyproject.toml=1.2.0"
        );
        assert_eq!(cat.get("changelog_match").unwrap().severity, Severity::Pass);
    }

    #[test]
    fn dynamic_lookup_trusts_manifest() {
        let pyproject = manifest("2.0.0");
        let (_dir, ctx) = fixture(&[
            (
                "netbox_demo/__init__.py",
                "from importlib.metadata import version\n__version__ = version(\"netbox-demo\")\n",
            ),
            ("pyproject.toml", pyproject.as_str()),
            ("CHANGELOG.md", "## [1.9.0] - 2025-01-01\n"),
        ]);
        let cat = Versioning::new().run(&ctx).unwrap();
        assert_eq!(cat.errors(), 0, "{cat:#?}");
        assert_eq!(cat.get("pyproject_match").unwrap().severity, Severity::Pass);
        assert_eq!(
            cat.get("changelog_match").unwrap().message,
            "CHANGELOG latest (1.9.0) != __version__ (2.0.0)"
        );
    }

    #[test]
    fn manifest_only_version_warns() {
        let pyproject = manifest("0.4.1");
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", "X = 1\n"),
            ("pyproject.toml", pyproject.as_str()),
        ]);
        let cat = Versioning::new().run(&ctx).unwrap();
        assert_eq!(cat.get("semver").unwrap().severity, Severity::Pass);
        assert_eq!(cat.get("version_source").unwrap().severity, Severity::Warning);
        assert!(cat.get("pyproject_match").is_none());
        assert_eq!(cat.get("changelog_match").unwrap().severity, Severity::Info);
    }

    #[test]
    fn nothing_declared() {
        let (_dir, ctx) = fixture(&[("netbox_demo/__init__.py", "")]);
        let cat = Versioning::new().run(&ctx).unwrap();
        assert_eq!(cat.get("semver").unwrap().severity, Severity::Error);
        assert_eq!(
            cat.get("pyproject_match").unwrap().message,
            "No version in pyproject.toml"
        );
    }

    #[test]
    fn follows_the_runner_package_override() {
        let pyproject = manifest("1.0.0");
        let (dir, _) = fixture(&[
            ("netbox_a/__init__.py", "__version__ = \"9.9.9\"\n"),
            ("netbox_b/__init__.py", "__version__ = \"1.0.0\"\n"),
            ("pyproject.toml", pyproject.as_str()),
        ]);
        let runner = CheckRunner::builder()
            .root(dir.path())
            .package_dir(dir.path().join("netbox_b"))
            .check(Versioning::new())
            .build()
            .unwrap();
        let cat = runner.run().remove(0);
        let matched = cat.get("pyproject_match").unwrap();
        assert_eq!(matched.severity, Severity::Pass, "{cat:#?}");
        assert_eq!(matched.message, "pyproject.toml version matches (1.0.0)");
    }

    #[test]
    fn no_package() {
        let (_dir, ctx) = fixture(&[]);
        let cat = Versioning::new().run(&ctx).unwrap();
        assert_eq!(cat.total(), 1);
        assert_eq!(cat.get("package").unwrap().message, "No package directory");
    }
}
