//! Check the `pyproject.toml` packaging manifest.

use nbaudit_core::metadata::{read_manifest, ManifestError};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use toml::{Table, Value};

/// Check name for pyproject.
pub const NAME: &str = "pyproject";

const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "version",
    "description",
    "readme",
    "requires-python",
    "authors",
];
const RECOMMENDED_FIELDS: &[&str] = &["license", "classifiers", "keywords", "dependencies"];
const EXPECTED_URLS: &[&str] = &["Homepage", "Repository", "Issues", "Documentation", "Changelog"];
const DEV_TOOLS: &[&str] = &["black", "flake8", "isort"];
const SUPPORTED_PYTHONS: &[&str] = &["3.10", "3.11", "3.12"];

/// Validates build system, project metadata and tool configuration.
#[derive(Debug, Clone, Default)]
pub struct Pyproject;

impl Pyproject {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Pyproject {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "pyproject.toml"
    }

    fn tag(&self) -> &'static str {
        "P"
    }

    fn description(&self) -> &'static str {
        "Build system, [project] metadata, URLs, dev extras and formatter config"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let data = match read_manifest(&ctx.root) {
            Ok(Some(data)) => data,
            Ok(None) => {
                cat.error("exists", "pyproject.toml not found");
                return Ok(cat);
            }
            Err(ManifestError::Parse { message, .. }) => {
                cat.error("parse", format!("Failed to parse pyproject.toml: {message}"));
                return Ok(cat);
            }
            Err(ManifestError::Io { path, source }) => return Err(CheckError::io(path, source)),
        };

        check_build_system(&mut cat, &data);

        let Some(project) = table(&data, "project").filter(|p| !p.is_empty()) else {
            cat.error("project", "[project] section missing");
            return Ok(cat);
        };

        for field in REQUIRED_FIELDS {
            if project.contains_key(*field) {
                cat.pass(format!("project_{field}"), format!("project.{field} set"));
            } else {
                cat.error(format!("project_{field}"), format!("project.{field} missing"));
            }
        }
        for field in RECOMMENDED_FIELDS {
            if project.contains_key(*field) {
                cat.pass(format!("project_{field}"), format!("project.{field} set"));
            } else {
                cat.warn(format!("project_{field}"), format!("project.{field} missing"));
            }
        }

        check_license(&mut cat, project);
        check_python(&mut cat, project);
        check_classifiers(&mut cat, project);
        check_urls(&mut cat, project);
        check_dev_extras(&mut cat, project);

        let empty = Table::new();
        let tool = table(&data, "tool").unwrap_or(&empty);
        check_setuptools(&mut cat, tool);
        check_formatters(&mut cat, tool);

        Ok(cat)
    }
}

fn table<'a>(parent: &'a Table, key: &str) -> Option<&'a Table> {
    parent.get(key).and_then(Value::as_table)
}

fn strings(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn check_build_system(cat: &mut CategoryResult, data: &Table) {
    match table(data, "build-system").filter(|t| !t.is_empty()) {
        Some(bs) => {
            if strings(bs.get("requires")).iter().any(|r| r.contains("setuptools")) {
                cat.pass("build_system", "setuptools build system configured");
            } else {
                cat.warn("build_system", "Build system doesn't use setuptools");
            }
        }
        None => cat.error("build_system", "[build-system] section missing"),
    }
}

fn check_license(cat: &mut CategoryResult, project: &Table) {
    let Some(license) = project.get("license") else {
        return;
    };
    let text = match license {
        Value::String(s) => Some(s.as_str()),
        Value::Table(t) => t.get("text").and_then(Value::as_str),
        _ => None,
    };
    if text.is_some_and(|t| t.contains("Apache")) {
        cat.pass("license_type", "License is Apache-2.0");
    } else {
        let shown = match license {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        cat.info("license_type", format!("License: {shown}"));
    }
}

fn check_python(cat: &mut CategoryResult, project: &Table) {
    let req = project
        .get("requires-python")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if SUPPORTED_PYTHONS.iter().any(|v| req.contains(v)) {
        cat.pass("python_version", format!("requires-python: {req}"));
    } else if !req.is_empty() {
        cat.warn(
            "python_version",
            format!("requires-python: {req} (expected >=3.10)"),
        );
    }
}

fn check_classifiers(cat: &mut CategoryResult, project: &Table) {
    let classifiers = strings(project.get("classifiers"));
    if classifiers.iter().any(|c| c.contains("Django")) {
        cat.pass("classifier_django", "Framework :: Django classifier present");
    } else {
        cat.warn("classifier_django", "Missing Framework :: Django classifier");
    }
    if classifiers.iter().any(|c| c.contains("Python :: 3")) {
        cat.pass("classifier_python", "Python 3 classifiers present");
    } else {
        cat.warn("classifier_python", "Missing Python 3 classifiers");
    }
}

fn check_urls(cat: &mut CategoryResult, project: &Table) {
    let empty = Table::new();
    let urls = table(project, "urls").unwrap_or(&empty);
    for name in EXPECTED_URLS {
        let id = format!("url_{}", name.to_lowercase());
        if urls.contains_key(*name) {
            cat.pass(id, format!("{name} URL set"));
        } else {
            cat.warn(id, format!("{name} URL missing"));
        }
    }
}

fn check_dev_extras(cat: &mut CategoryResult, project: &Table) {
    let dev = table(project, "optional-dependencies")
        .map(|o| strings(o.get("dev")))
        .unwrap_or_default();
    if dev.is_empty() {
        cat.warn("dev_deps", "No [project.optional-dependencies] dev section");
        return;
    }
    cat.pass("dev_deps", format!("Dev dependencies: {}", dev.join(", ")));
    for tool in DEV_TOOLS {
        if dev.iter().any(|d| d.contains(tool)) {
            cat.pass(format!("dev_{tool}"), format!("{tool} in dev dependencies"));
        } else {
            cat.warn(
                format!("dev_{tool}"),
                format!("{tool} missing from dev dependencies"),
            );
        }
    }
}

fn check_setuptools(cat: &mut CategoryResult, tool: &Table) {
    let setuptools = table(tool, "setuptools");
    let find = setuptools
        .and_then(|s| table(s, "packages"))
        .and_then(|p| table(p, "find"))
        .is_some_and(|f| !f.is_empty());
    if find {
        cat.pass("setuptools_find", "setuptools packages.find configured");
    } else {
        cat.warn("setuptools_find", "setuptools packages.find not configured");
    }

    let package_data = setuptools
        .and_then(|s| table(s, "package-data"))
        .is_some_and(|d| !d.is_empty());
    if package_data {
        cat.pass("package_data", "package-data configured for templates");
    } else {
        cat.warn("package_data", "package-data not configured");
    }
}

fn check_formatters(cat: &mut CategoryResult, tool: &Table) {
    let black = table(tool, "black").filter(|t| !t.is_empty());
    let black_len = black
        .and_then(|b| b.get("line-length"))
        .and_then(Value::as_integer);
    match black {
        Some(_) => {
            let shown = black_len.map_or_else(|| "None".to_owned(), |l| l.to_string());
            cat.pass(
                "black_config",
                format!("[tool.black] configured (line-length={shown})"),
            );
        }
        None => cat.warn("black_config", "[tool.black] section missing"),
    }

    let Some(isort) = table(tool, "isort").filter(|t| !t.is_empty()) else {
        cat.warn("isort_config", "[tool.isort] section missing");
        return;
    };

    let profile = isort
        .get("profile")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if profile == "black" {
        cat.pass("isort_config", "[tool.isort] profile = \"black\"");
    } else {
        cat.warn(
            "isort_config",
            format!("[tool.isort] profile = \"{profile}\" (expected \"black\")"),
        );
    }

    let isort_len = isort.get("line_length").and_then(Value::as_integer);
    if let (Some(i), Some(b)) = (isort_len, black_len) {
        if i == b {
            cat.pass(
                "line_length_match",
                format!("isort/black line-length match ({b})"),
            );
        } else {
            cat.warn(
                "line_length_match",
                format!("isort ({i}) != black ({b}) line-length"),
            );
        }
    }
}
