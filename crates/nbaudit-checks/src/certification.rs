//! Check the requirements of the NetBox Plugin Certification Program.

use std::path::Path;
use std::sync::LazyLock;

use nbaudit_core::metadata::{read_manifest, ManifestError};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use regex::Regex;
use toml::Value;
use tracing::debug;

use crate::util::{read, regex};

/// Check name for certification.
pub const NAME: &str = "certification";

/// License families compatible with Apache-2.0.
const COMPATIBLE_LICENSES: &[&str] = &[
    "apache", "mit", "bsd", "cddl", "lgpl", "gpl", "mpl", "epl", "isc",
];
const LICENSE_FILES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt"];
const ICON_FILES: &[&str] = &["icon.png", "icon.svg", "logo.png", "logo.svg"];
const ICON_DIRS: &[&str] = &["", "docs", "images", "assets", "static"];
const TEST_DIRS: &[&str] = &["tests", "test"];
const CONTRIBUTING_FILES: &[&str] = &[
    "CONTRIBUTING.md",
    "CONTRIBUTING.rst",
    ".github/CONTRIBUTING.md",
];
const TEST_COMMANDS: &[&str] = &["pytest", "python -m test", "manage.py test"];

static COMPAT: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)compat|version.*matrix|version.*range|netbox.*version|supported.*version")
});
static DEPENDENCIES: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)(?:^|\n)#{1,3}\s*depend|requirements|prerequisites"));
static MEDIA: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)!\[.*\]\(.*\.(?:png|jpg|jpeg|gif|svg|webp)|<img.*src=|!\[.*\]\(.*(?:recording|demo|screenshot)",
    )
});
static INSTALL: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)(?:^|\n)#{1,3}\s*install|pip install"));
static SUPPORT: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)support|contact|issues|bug.*report|contribute|community"));
static BREAKING: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)breaking|backward|incompatible|migration"));

/// Checks license, documentation, tests and CI against the certification
/// program's requirements.
#[derive(Debug, Clone, Default)]
pub struct Certification;

impl Certification {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Certification {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Certification"
    }

    fn tag(&self) -> &'static str {
        "T"
    }

    fn description(&self) -> &'static str {
        "License, README requirements, icon, tests, CI, CONTRIBUTING and PyPI metadata"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        check_license(&mut cat, ctx)?;
        check_readme(&mut cat, ctx)?;

        let has_icon = ICON_DIRS
            .iter()
            .flat_map(|dir| ICON_FILES.iter().map(move |f| Path::new(dir).join(f)))
            .any(|p| ctx.is_file(p));
        if has_icon {
            cat.pass("icon", "Plugin icon found");
        } else {
            cat.info("icon", "No plugin icon found (recommended for certification)");
        }

        check_tests(&mut cat, ctx);

        if ci_runs_tests(ctx) {
            cat.pass("ci_tests", "CI workflow runs tests");
        } else {
            cat.warn(
                "ci_tests",
                "No CI workflow running tests (required for certification)",
            );
        }

        let changelog = ctx.path("CHANGELOG.md");
        if changelog.is_file() {
            if BREAKING.is_match(&read(&changelog)?) {
                cat.pass("breaking_changes", "Breaking changes documented in CHANGELOG");
            } else {
                cat.info("breaking_changes", "No breaking changes noted (OK if none exist)");
            }
        } else {
            cat.warn(
                "changelog_cert",
                "CHANGELOG.md missing (required for certification)",
            );
        }

        if CONTRIBUTING_FILES.iter().any(|f| ctx.is_file(f)) {
            cat.pass("contributing", "CONTRIBUTING guide found");
        } else {
            cat.info(
                "contributing",
                "No CONTRIBUTING guide (recommended for certification)",
            );
        }

        check_pypi_metadata(&mut cat, ctx)?;

        Ok(cat)
    }
}

fn check_license(cat: &mut CategoryResult, ctx: &AuditContext) -> Result<(), CheckError> {
    let Some(path) = LICENSE_FILES
        .iter()
        .map(|f| ctx.path(f))
        .find(|p| p.is_file())
    else {
        cat.error(
            "license_file",
            "No LICENSE file found (required for certification)",
        );
        return Ok(());
    };

    cat.pass(
        "license_file",
        format!("License file found: {}", ctx.display_path(&path)),
    );
    let text = read(&path)?.to_lowercase();
    if COMPATIBLE_LICENSES.iter().any(|l| text.contains(l)) {
        cat.pass(
            "license_osi",
            "License appears OSI-approved and Apache 2.0 compatible",
        );
    } else {
        cat.warn(
            "license_osi",
            "License may not be OSI-approved or Apache 2.0 compatible",
        );
    }
    Ok(())
}

fn check_readme(cat: &mut CategoryResult, ctx: &AuditContext) -> Result<(), CheckError> {
    let path = ctx.path("README.md");
    if !path.is_file() {
        cat.error("readme_cert", "README.md missing (required for certification)");
        return Ok(());
    }
    let readme = read(&path)?;

    if COMPAT.is_match(&readme) {
        cat.pass("compat_matrix", "Version compatibility info found in README");
    } else {
        cat.warn(
            "compat_matrix",
            "No version compatibility matrix in README (required for certification)",
        );
    }

    if DEPENDENCIES.is_match(&readme) {
        cat.pass("deps_documented", "Dependencies documented in README");
    } else {
        cat.info("deps_documented", "No dependencies section in README");
    }

    if MEDIA.is_match(&readme) {
        cat.pass("screenshots", "Screenshots/recordings found in README");
    } else {
        cat.warn(
            "screenshots",
            "No screenshots or recordings in README (required for certification)",
        );
    }

    if INSTALL.is_match(&readme) {
        cat.pass("install_docs", "Installation instructions found");
    } else {
        cat.warn("install_docs", "No installation instructions in README");
    }

    if SUPPORT.is_match(&readme) {
        cat.pass("support_info", "Support/contact info found in README");
    } else {
        cat.info("support_info", "No support/contact section in README");
    }
    Ok(())
}

fn check_tests(cat: &mut CategoryResult, ctx: &AuditContext) {
    // Package-local test dirs win over root-level ones of the same name.
    let test_dir = TEST_DIRS.iter().find_map(|name| {
        ctx.package_path(name)
            .filter(|p| p.is_dir())
            .or_else(|| Some(ctx.path(name)).filter(|p| p.is_dir()))
    });

    match test_dir {
        None => cat.warn(
            "tests_exist",
            "No test directory found (required for certification)",
        ),
        Some(dir) => match count_test_files(&dir) {
            0 => cat.warn("tests_exist", "Test directory found but no test files"),
            n => cat.pass("tests_exist", format!("Test directory found ({n} test files)")),
        },
    }
}

/// Counts `test_*.py` and `*_test.py` files below `dir`.
fn count_test_files(dir: &Path) -> usize {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{base}/**/*.py");
    match glob::glob(&pattern) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("test_") || n.ends_with("_test.py"))
            })
            .count(),
        Err(e) => {
            debug!("Bad test glob {}: {}", pattern, e);
            0
        }
    }
}

fn ci_runs_tests(ctx: &AuditContext) -> bool {
    let Ok(entries) = std::fs::read_dir(ctx.path(".github/workflows")) else {
        return false;
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "yml" || e == "yaml"))
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .any(|content| {
            let content = content.to_lowercase();
            TEST_COMMANDS.iter().any(|c| content.contains(c))
        })
}

fn check_pypi_metadata(cat: &mut CategoryResult, ctx: &AuditContext) -> Result<(), CheckError> {
    let data = match read_manifest(&ctx.root) {
        Ok(Some(data)) => data,
        Ok(None) => return Ok(()),
        Err(ManifestError::Parse { message, .. }) => {
            cat.warn(
                "pypi_metadata",
                format!("Cannot read PyPI metadata from pyproject.toml: {message}"),
            );
            return Ok(());
        }
        Err(ManifestError::Io { path, source }) => return Err(CheckError::io(path, source)),
    };
    let project = data.get("project").and_then(Value::as_table);

    let has_license = project
        .and_then(|p| p.get("license"))
        .is_some_and(|l| match l {
            Value::String(s) => !s.is_empty(),
            Value::Table(t) => !t.is_empty(),
            _ => true,
        });
    if has_license {
        cat.pass("pypi_license", "License declared in pyproject.toml");
    } else {
        cat.warn(
            "pypi_license",
            "No license in pyproject.toml (must match PyPI listing)",
        );
    }

    match project
        .and_then(|p| p.get("urls"))
        .and_then(Value::as_table)
        .filter(|u| !u.is_empty())
    {
        Some(urls) => cat.pass(
            "pypi_urls",
            format!("Project URLs configured ({} URLs)", urls.len()),
        ),
        None => cat.warn("pypi_urls", "No project URLs in pyproject.toml"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use nbaudit_core::Severity;

    const README: &str = "# Demo\n\n## Compatibility\n\n| NetBox | Plugin |\n\n\
                          ## Requirements\n\n## Installation\n\npip install netbox-demo\n\n\
                          ![List](docs/img/list.png)\n\nReport issues on GitHub.\n";

    #[test]
    fn certified_layout_passes() {
        let (_dir, ctx) = fixture(&[
            ("LICENSE", "Apache License\nVersion 2.0\n"),
            ("README.md", README),
            ("docs/icon.svg", "<svg/>"),
            ("tests/__init__.py", ""),
            ("tests/test_models.py", ""),
            ("tests/api/test_views.py", ""),
            (".github/workflows/test.yml", "run: pytest\n"),
            ("CHANGELOG.md", "## [1.0.0]\n### Breaking\n"),
            (".github/CONTRIBUTING.md", ""),
            (
                "pyproject.toml",
                "[project]\nlicense = \"Apache-2.0\"\n[project.urls]\nHomepage = \"x\"\nIssues = \"y\"\n",
            ),
        ]);
        let cat = Certification::new().run(&ctx).unwrap();
        assert_eq!(cat.passed(), cat.total(), "{cat:#?}");
        assert_eq!(
            cat.get("tests_exist").unwrap().message,
            "Test directory found (2 test files)"
        );
        assert_eq!(
            cat.get("pypi_urls").unwrap().message,
            "Project URLs configured (2 URLs)"
        );
    }

    #[test]
    fn bare_repository() {
        let (_dir, ctx) = fixture(&[]);
        let cat = Certification::new().run(&ctx).unwrap();
        assert_eq!(cat.get("license_file").unwrap().severity, Severity::Error);
        assert_eq!(cat.get("readme_cert").unwrap().severity, Severity::Error);
        assert_eq!(cat.get("tests_exist").unwrap().severity, Severity::Warning);
        assert_eq!(cat.get("changelog_cert").unwrap().severity, Severity::Warning);
        assert!(cat.get("pypi_license").is_none());
    }

    #[test]
    fn package_test_dir_is_preferred() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/tests/test_api.py", ""),
            ("tests/conftest.py", ""),
        ]);
        let cat = Certification::new().run(&ctx).unwrap();
        assert_eq!(
            cat.get("tests_exist").unwrap().message,
            "Test directory found (1 test files)"
        );
    }

    #[test]
    fn proprietary_license_warns() {
        let (_dir, ctx) = fixture(&[("LICENSE.txt", "All rights reserved.\n")]);
        let cat = Certification::new().run(&ctx).unwrap();
        assert_eq!(
            cat.get("license_file").unwrap().message,
            "License file found: LICENSE.txt"
        );
        assert_eq!(cat.get("license_osi").unwrap().severity, Severity::Warning);
    }
}
