//! Check for the expected files and directories of a plugin repository.

use nbaudit_core::metadata::{find_changelog, ENTRY_POINT};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError, Severity};

/// Check name for structure.
pub const NAME: &str = "structure";

/// Root files a plugin cannot be released without.
const REQUIRED_ERROR_FILES: &[&str] = &["pyproject.toml", "README.md"];
/// Root files every plugin should ship; reported after the changelog.
const REQUIRED_WARNING_FILES: &[&str] = &["LICENSE", ".gitignore"];

const RECOMMENDED_FILES: &[(&str, &str)] = &[
    ("CONTRIBUTING.md", "CONTRIBUTING.md not found (recommended)"),
    (
        "COMPATIBILITY.md",
        "COMPATIBILITY.md not found (recommended for version tracking)",
    ),
    (
        ".editorconfig",
        ".editorconfig not found (recommended for consistent formatting)",
    ),
    (
        ".pre-commit-config.yaml",
        ".pre-commit-config.yaml not found (recommended)",
    ),
];

/// Verifies required files, recommended files and the package layout.
#[derive(Debug, Clone, Default)]
pub struct Structure;

impl Structure {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Structure {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Structure"
    }

    fn tag(&self) -> &'static str {
        "F"
    }

    fn description(&self) -> &'static str {
        "Required and recommended files, docs, workflows and package layout"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        for file in REQUIRED_ERROR_FILES {
            file_result(&mut cat, ctx, file, Severity::Error);
        }

        match find_changelog(&ctx.root) {
            Some(path) => cat.pass(
                "CHANGELOG.md",
                format!("{} exists", ctx.display_path(&path)),
            ),
            None => cat.warn("CHANGELOG.md", "CHANGELOG.md not found"),
        }

        for file in REQUIRED_WARNING_FILES {
            file_result(&mut cat, ctx, file, Severity::Warning);
        }

        for &(file, missing) in RECOMMENDED_FILES {
            if ctx.is_file(file) {
                cat.pass(file, format!("{file} exists"));
            } else {
                cat.info(file, missing);
            }
        }

        if ctx.is_dir("docs") {
            cat.pass("docs_dir", "docs/ directory exists");
            if ctx.is_file("mkdocs.yml") {
                cat.pass("mkdocs", "mkdocs.yml exists");
            }
        } else {
            cat.info(
                "docs_dir",
                "docs/ directory not found (recommended for extended docs)",
            );
        }

        if ctx.is_dir(".github/workflows") {
            cat.pass("workflows", ".github/workflows/ exists");
        } else {
            cat.warn("workflows", ".github/workflows/ not found");
        }

        match (&ctx.package_dir, ctx.package_name()) {
            (Some(dir), Some(name)) => {
                cat.pass("package_dir", format!("Plugin package found: {name}"));
                if dir.join(ENTRY_POINT).is_file() {
                    cat.pass("init_py", "__init__.py exists");
                } else {
                    cat.error("init_py", "__init__.py not found in package");
                }
                if dir.join("templates").is_dir() {
                    cat.pass("templates", "templates/ directory exists");
                } else {
                    cat.info("templates", "templates/ directory not found");
                }
            }
            _ => cat.error("package_dir", "No netbox_* package directory found"),
        }

        Ok(cat)
    }
}

fn file_result(cat: &mut CategoryResult, ctx: &AuditContext, file: &str, missing: Severity) {
    if ctx.is_file(file) {
        cat.pass(file, format!("{file} exists"));
    } else {
        cat.push(file, missing, format!("{file} not found"));
    }
}
