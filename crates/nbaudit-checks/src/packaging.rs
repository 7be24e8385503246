//! Build the distribution, validate it with twine and compare against PyPI.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use nbaudit_core::metadata::{read_manifest, MANIFEST_FILE};
use nbaudit_core::process::{run_tool, ToolOutcome};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError, CheckGroup};
use serde::Deserialize;
use toml::Value;
use tracing::debug;

use crate::http::{HttpClient, HttpError};
use crate::util::truncate;

/// Check name for packaging.
pub const NAME: &str = "packaging";

const PYPI_BASE: &str = "https://pypi.org/pypi";
const BUILD_ERROR_LIMIT: usize = 300;
const TWINE_ERROR_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct PypiRelease {
    info: PypiInfo,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    #[serde(default)]
    version: String,
    #[serde(default)]
    project_urls: Option<BTreeMap<String, String>>,
}

/// Builds wheel and sdist into a scratch directory and checks the PyPI listing.
pub struct Packaging {
    python: String,
    build_timeout: Duration,
    twine_timeout: Duration,
    offline: bool,
    client: Box<dyn HttpClient>,
}

impl Packaging {
    /// Creates a new check.
    #[must_use]
    pub fn new(python: impl Into<String>, client: Box<dyn HttpClient>) -> Self {
        Self {
            python: python.into(),
            build_timeout: Duration::from_secs(120),
            twine_timeout: Duration::from_secs(30),
            offline: false,
            client,
        }
    }

    /// Sets the build and twine timeouts.
    #[must_use]
    pub fn timeouts(mut self, build: Duration, twine: Duration) -> Self {
        self.build_timeout = build;
        self.twine_timeout = twine;
        self
    }

    /// Skips the PyPI lookup.
    #[must_use]
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    fn exec(&self, args: &[&str], cwd: &Path, timeout: Duration) -> Result<ToolOutcome, CheckError> {
        run_tool(&self.python, args, cwd, timeout).map_err(|source| CheckError::Process {
            tool: self.python.clone(),
            source,
        })
    }

    fn build(&self, cat: &mut CategoryResult, root: &Path) -> Result<(), CheckError> {
        let outdir = tempfile::tempdir().map_err(|e| CheckError::io(root, e))?;
        let out_path = outdir.path().to_string_lossy().into_owned();

        let output = match self.exec(&["-m", "build", "--outdir", &out_path], root, self.build_timeout)? {
            ToolOutcome::NotInstalled => {
                cat.info("build", "python -m build not available (skipped)");
                return Ok(());
            }
            ToolOutcome::Completed(out) if out.missing_module("build") => {
                cat.info("build", "python -m build not available (skipped)");
                return Ok(());
            }
            ToolOutcome::TimedOut => {
                cat.warn(
                    "build",
                    format!("Build timed out ({}s)", self.build_timeout.as_secs()),
                );
                return Ok(());
            }
            ToolOutcome::Completed(out) => out,
        };

        if !output.success() {
            let error = truncate(output.combined().trim(), BUILD_ERROR_LIMIT);
            cat.error("build", format!("Build failed: {error}"));
            return Ok(());
        }

        let mut built: Vec<String> = std::fs::read_dir(outdir.path())
            .map_err(|e| CheckError::io(outdir.path(), e))?
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        built.sort();
        cat.pass("build", format!("Build succeeded: {}", built.join(", ")));

        if built.iter().any(|f| f.ends_with(".whl")) {
            cat.pass("wheel", "Wheel (.whl) built");
        } else {
            cat.warn("wheel", "No wheel (.whl) built");
        }
        if built.iter().any(|f| f.ends_with(".tar.gz")) {
            cat.pass("sdist", "Source dist (.tar.gz) built");
        } else {
            cat.info("sdist", "No source dist (.tar.gz) built");
        }

        let paths: Vec<String> = built
            .iter()
            .map(|f| outdir.path().join(f).to_string_lossy().into_owned())
            .collect();
        let mut args = vec!["-m", "twine", "check"];
        args.extend(paths.iter().map(String::as_str));
        match self.exec(&args, root, self.twine_timeout)? {
            ToolOutcome::Completed(out) if out.missing_module("twine") => {
                cat.info("twine", "twine not installed (skipped)");
            }
            ToolOutcome::Completed(out) if out.success() => cat.pass("twine", "twine check passed"),
            ToolOutcome::Completed(out) => cat.warn(
                "twine",
                format!(
                    "twine check failed: {}",
                    truncate(out.combined().trim(), TWINE_ERROR_LIMIT)
                ),
            ),
            ToolOutcome::NotInstalled => cat.info("twine", "twine not installed (skipped)"),
            ToolOutcome::TimedOut => cat.warn(
                "twine",
                format!("twine check timed out ({}s)", self.twine_timeout.as_secs()),
            ),
        }
        Ok(())
    }

    fn check_pypi(&self, cat: &mut CategoryResult, root: &Path) {
        let project = match read_manifest(root) {
            Ok(Some(data)) => data.get("project").and_then(Value::as_table).cloned(),
            Ok(None) => None,
            Err(e) => {
                debug!("Skipping PyPI lookup: {}", e);
                None
            }
        };
        let Some(project) = project else {
            return;
        };
        let Some(name) = project.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
            return;
        };
        let local = project.get("version").and_then(Value::as_str).unwrap_or_default();

        let release = self
            .client
            .get_json(&format!("{PYPI_BASE}/{name}/json"))
            .and_then(|body| {
                serde_json::from_str::<PypiRelease>(&body)
                    .map_err(|e| HttpError::Other(format!("unexpected response: {e}")))
            });
        let info = match release {
            Ok(r) => r.info,
            Err(HttpError::Status { status: 404 }) => {
                cat.info(
                    "pypi_exists",
                    format!("{name} not found on PyPI (not yet published?)"),
                );
                return;
            }
            Err(e) => {
                cat.info("pypi_exists", format!("Could not check PyPI: {e}"));
                return;
            }
        };

        let remote = info.version.as_str();
        cat.pass(
            "pypi_exists",
            format!("{name} found on PyPI (latest: {remote})"),
        );

        if !local.is_empty() && !remote.is_empty() {
            if local == remote {
                cat.pass(
                    "pypi_version",
                    format!("Local version matches PyPI ({local})"),
                );
            } else {
                cat.info(
                    "pypi_version",
                    format!("Local version ({local}) differs from PyPI ({remote})"),
                );
            }
        }

        match info.project_urls.filter(|u| !u.is_empty()) {
            Some(urls) => {
                let names: Vec<&str> = urls.keys().map(String::as_str).collect();
                cat.pass(
                    "pypi_project_urls",
                    format!("PyPI project URLs: {}", names.join(", ")),
                );
            }
            None => cat.warn("pypi_project_urls", "No project URLs on PyPI listing"),
        }
    }
}

impl std::fmt::Debug for Packaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packaging")
            .field("python", &self.python)
            .field("build_timeout", &self.build_timeout)
            .field("twine_timeout", &self.twine_timeout)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

impl Check for Packaging {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Packaging"
    }

    fn tag(&self) -> &'static str {
        "B"
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Build
    }

    fn description(&self) -> &'static str {
        "python -m build, wheel/sdist, twine check and PyPI listing"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        if !ctx.is_file(MANIFEST_FILE) {
            cat.error("pyproject", "pyproject.toml not found, cannot build");
            return Ok(cat);
        }

        self.build(&mut cat, &ctx.root)?;

        if self.offline {
            debug!("Offline: skipping PyPI lookup");
        } else {
            self.check_pypi(&mut cat, &ctx.root);
        }

        Ok(cat)
    }
}
