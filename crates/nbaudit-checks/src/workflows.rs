//! Check GitHub Actions CI and release workflows.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use regex::Regex;

use crate::util::{read, regex};

/// Check name for workflows.
pub const NAME: &str = "workflows";

const CI_CANDIDATES: &[&str] = &[
    "ci.yml",
    "ci.yaml",
    "lint.yml",
    "lint.yaml",
    "test.yml",
    "test.yaml",
];
const RELEASE_CANDIDATES: &[&str] = &[
    "release.yml",
    "release.yaml",
    "publish.yml",
    "publish.yaml",
];
const CLASSIC_LINTERS: &[&str] = &["black", "isort", "flake8"];

static PYTHON_VERSION: LazyLock<Regex> = LazyLock::new(|| regex(r#"['"]?(3\.1[0-9])['"]?"#));

// Inline (`tags: [v*]`, `tags: 'v*'`) or block list (`tags:\n  - "v*"`).
static TAG_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r#"tags.*v\*|tags.*\[.*v|tags\s*:\s*\n(?:[ \t]*-[^\n]*\n)*?[ \t]*-\s*['"]?v"#)
});

static GH_RELEASE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)gh-release|action-gh-release|create.*release"));

/// Validates the CI workflow content and the release pipeline.
#[derive(Debug, Clone, Default)]
pub struct Workflows;

impl Workflows {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Workflows {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Workflows"
    }

    fn tag(&self) -> &'static str {
        "W"
    }

    fn description(&self) -> &'static str {
        "CI lint tools, Python matrix, package build and tag-triggered release"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let dir = ctx.path(".github/workflows");
        if !dir.is_dir() {
            cat.warn("workflows_dir", ".github/workflows/ not found");
            return Ok(cat);
        }

        match first_existing(&dir, CI_CANDIDATES) {
            Some(path) => {
                cat.pass(
                    "ci_exists",
                    format!("CI workflow found: {}", file_name(&path)),
                );
                check_ci(&mut cat, &read(&path)?);
            }
            None => cat.warn(
                "ci_exists",
                "No CI workflow found (ci.yml, lint.yml, test.yml)",
            ),
        }

        match first_existing(&dir, RELEASE_CANDIDATES) {
            Some(path) => {
                cat.pass(
                    "release_exists",
                    format!("Release workflow found: {}", file_name(&path)),
                );
                check_release(&mut cat, &read(&path)?);
            }
            None => cat.warn("release_exists", "No release workflow found"),
        }

        Ok(cat)
    }
}

fn first_existing(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|c| dir.join(c))
        .find(|p| p.is_file())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn check_ci(cat: &mut CategoryResult, content: &str) {
    if content.contains("ruff") {
        cat.pass("ci_ruff", "ruff in CI workflow (modern linter)");
    } else {
        for tool in CLASSIC_LINTERS {
            let id = format!("ci_{tool}");
            if content.contains(tool) {
                cat.pass(id, format!("{tool} in CI workflow"));
            } else {
                cat.warn(id, format!("{tool} not found in CI workflow"));
            }
        }
    }

    let versions: BTreeSet<&str> = PYTHON_VERSION
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let versions: Vec<&str> = versions.into_iter().collect();
    match versions.as_slice() {
        [] => cat.info("ci_python_matrix", "No Python version matrix detected"),
        [only] => cat.warn(
            "ci_python_matrix",
            format!("Only tests Python {only} (recommend 3.10, 3.11, 3.12)"),
        ),
        many => cat.pass(
            "ci_python_matrix",
            format!("Tests Python {}", many.join(", ")),
        ),
    }

    if content.contains("build") && content.contains("twine") {
        cat.pass("ci_package", "Package build check in CI");
    } else {
        cat.info("ci_package", "No package build check in CI");
    }
}

fn check_release(cat: &mut CategoryResult, content: &str) {
    if TAG_TRIGGER.is_match(content) {
        cat.pass("release_trigger", "Release triggers on tag push");
    } else {
        cat.warn("release_trigger", "Release may not trigger on tag push");
    }

    if content.to_lowercase().contains("pypi") {
        cat.pass("release_pypi", "PyPI publish configured");
    } else {
        cat.info("release_pypi", "No PyPI publish step detected");
    }

    if GH_RELEASE.is_match(content) {
        cat.pass("release_github", "GitHub Release creation configured");
    } else {
        cat.info("release_github", "No GitHub Release creation detected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use nbaudit_core::Severity;

    const CI: &str = r#"
name: CI
on: [push, pull_request]
jobs:
  lint:
    runs-on: ubuntu-latest
    steps:
      - run: pip install ruff
      - run: ruff check .
  test:
    strategy:
      matrix:
        python-version: ["3.12", "3.10", "3.11"]
  package:
    steps:
      - run: python -m build
      - run: twine check dist/*
"#;

    const RELEASE: &str = r#"
on:
  push:
    tags:
      - "v*"
jobs:
  publish:
    steps:
      - uses: pypa/gh-action-pypi-publish@release/v1
      - uses: softprops/action-gh-release@v2
"#;

    #[test]
    fn complete_workflows_pass() {
        let (_dir, ctx) = fixture(&[
            (".github/workflows/ci.yml", CI),
            (".github/workflows/release.yml", RELEASE),
        ]);
        let cat = Workflows::new().run(&ctx).unwrap();
        assert_eq!(cat.passed(), cat.total(), "{cat:#?}");
        assert_eq!(
            cat.get("ci_python_matrix").unwrap().message,
            "Tests Python 3.10, 3.11, 3.12"
        );
    }

    #[test]
    fn classic_linters_checked_without_ruff() {
        let ci = "steps:\n  - run: black --check .\n  - run: flake8\npython-version: '3.11'\n";
        let (_dir, ctx) = fixture(&[(".github/workflows/lint.yaml", ci)]);
        let cat = Workflows::new().run(&ctx).unwrap();
        assert_eq!(cat.get("ci_black").unwrap().severity, Severity::Pass);
        assert_eq!(cat.get("ci_isort").unwrap().severity, Severity::Warning);
        assert_eq!(
            cat.get("ci_python_matrix").unwrap().message,
            "Only tests Python 3.11 (recommend 3.10, 3.11, 3.12)"
        );
        assert_eq!(cat.get("release_exists").unwrap().severity, Severity::Warning);
    }

    #[test]
    fn branch_only_release_warns() {
        let release = "on:\n  push:\n    branches: [main]\njobs: {}\n";
        let (_dir, ctx) = fixture(&[(".github/workflows/publish.yml", release)]);
        let cat = Workflows::new().run(&ctx).unwrap();
        assert_eq!(cat.get("release_trigger").unwrap().severity, Severity::Warning);
        assert_eq!(cat.get("release_pypi").unwrap().severity, Severity::Info);
        assert_eq!(cat.get("ci_exists").unwrap().severity, Severity::Warning);
    }

    #[test]
    fn missing_workflow_dir() {
        let (_dir, ctx) = fixture(&[]);
        let cat = Workflows::new().run(&ctx).unwrap();
        assert_eq!(cat.total(), 1);
        assert_eq!(cat.warnings(), 1);
    }
}
