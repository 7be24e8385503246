//! Run the formatters and linters a plugin is expected to be clean under.

use std::path::Path;
use std::time::Duration;

use nbaudit_core::process::{run_tool, ToolOutcome, ToolOutput};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError, CheckGroup};

/// Check name for linting.
pub const NAME: &str = "linting";

const FLAKE8_ARGS: &[&str] = &["--max-line-length=120", "--ignore=E501,W503,E203"];
const FLAKE8_SHOWN: usize = 3;

/// Runs ruff (when available), black, isort and flake8 over the package.
#[derive(Debug, Clone)]
pub struct Linting {
    python: String,
    ruff: String,
    timeout: Duration,
}

impl Linting {
    /// Creates a new check using `python -m <tool>` for each tool.
    #[must_use]
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            ruff: "ruff".to_string(),
            timeout,
        }
    }

    /// Uses `program` instead of `ruff` from `PATH`.
    #[must_use]
    pub fn with_ruff(mut self, program: impl Into<String>) -> Self {
        self.ruff = program.into();
        self
    }

    fn exec(&self, program: &str, args: &[&str], cwd: &Path) -> Result<ToolOutcome, CheckError> {
        run_tool(program, args, cwd, self.timeout).map_err(|source| CheckError::Process {
            tool: program.to_owned(),
            source,
        })
    }

    fn ruff_available(&self, cwd: &Path) -> Result<bool, CheckError> {
        Ok(matches!(
            self.exec(&self.ruff, &["--version"], cwd)?,
            ToolOutcome::Completed(out) if out.success()
        ))
    }

    fn run_ruff(&self, cat: &mut CategoryResult, root: &Path, target: &str) -> Result<(), CheckError> {
        match self.exec(&self.ruff, &["check", target], root)? {
            ToolOutcome::Completed(out) if out.success() => {
                cat.pass("ruff_check", "ruff check passed");
            }
            ToolOutcome::Completed(out) => cat.warn(
                "ruff_check",
                format!("ruff found {} issue(s)", non_empty_lines(&out).len()),
            ),
            ToolOutcome::TimedOut => cat.warn("ruff_check", self.timed_out("ruff check")),
            ToolOutcome::NotInstalled => cat.info("ruff_check", "ruff not installed (skipped)"),
        }

        match self.exec(&self.ruff, &["format", "--check", target], root)? {
            ToolOutcome::Completed(out) if out.success() => {
                cat.pass("ruff_format", "ruff format check passed");
            }
            ToolOutcome::Completed(out) => cat.warn(
                "ruff_format",
                format!("ruff would reformat {} file(s)", reformat_count(&out)),
            ),
            ToolOutcome::TimedOut => cat.warn("ruff_format", self.timed_out("ruff format")),
            ToolOutcome::NotInstalled => cat.info("ruff_format", "ruff not installed (skipped)"),
        }
        Ok(())
    }

    /// Runs `python -m <module> <args>`; `None` when the module is unavailable.
    fn python_module(
        &self,
        cat: &mut CategoryResult,
        module: &str,
        args: &[&str],
        root: &Path,
    ) -> Result<Option<ToolOutput>, CheckError> {
        let mut argv = vec!["-m", module];
        argv.extend_from_slice(args);
        match self.exec(&self.python, &argv, root)? {
            ToolOutcome::Completed(out) if out.missing_module(module) => {
                cat.info(module, format!("{module} not installed (skipped)"));
                Ok(None)
            }
            ToolOutcome::Completed(out) => Ok(Some(out)),
            ToolOutcome::NotInstalled => {
                cat.info(module, format!("{module} not installed (skipped)"));
                Ok(None)
            }
            ToolOutcome::TimedOut => {
                cat.warn(module, self.timed_out(module));
                Ok(None)
            }
        }
    }

    fn timed_out(&self, tool: &str) -> String {
        format!("{tool} timed out ({}s)", self.timeout.as_secs())
    }
}

impl Check for Linting {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Linting"
    }

    fn tag(&self) -> &'static str {
        "Q"
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Lint
    }

    fn description(&self) -> &'static str {
        "ruff check/format, black, isort and flake8 over the package"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let Some(pkg_name) = ctx.package_name() else {
            cat.error("package", "No package directory to lint");
            return Ok(cat);
        };
        let target = format!("{pkg_name}/");
        let root = ctx.root.as_path();

        if self.ruff_available(root)? {
            self.run_ruff(&mut cat, root, &target)?;
        }

        if let Some(out) = self.python_module(&mut cat, "black", &["--check", &target], root)? {
            if out.success() {
                cat.pass("black", "black formatting check passed");
            } else {
                cat.warn(
                    "black",
                    format!("black would reformat {} file(s)", reformat_count(&out)),
                );
            }
        }

        if let Some(out) = self.python_module(&mut cat, "isort", &["--check-only", &target], root)? {
            if out.success() {
                cat.pass("isort", "isort import check passed");
            } else {
                cat.warn(
                    "isort",
                    format!(
                        "isort found {} import ordering issue(s)",
                        out.combined().matches("ERROR").count()
                    ),
                );
            }
        }

        let mut flake8_args = vec![target.as_str()];
        flake8_args.extend_from_slice(FLAKE8_ARGS);
        if let Some(out) = self.python_module(&mut cat, "flake8", &flake8_args, root)? {
            if out.success() {
                cat.pass("flake8", "flake8 lint check passed");
            } else {
                let lines = non_empty_lines(&out);
                let mut message = format!("flake8 found {} issue(s)", lines.len());
                if !lines.is_empty() {
                    let shown: Vec<&str> = lines.iter().take(FLAKE8_SHOWN).map(String::as_str).collect();
                    message.push_str(": ");
                    message.push_str(&shown.join("; "));
                }
                cat.warn("flake8", message);
            }
        }

        Ok(cat)
    }
}

fn non_empty_lines(out: &ToolOutput) -> Vec<String> {
    out.combined()
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

fn reformat_count(out: &ToolOutput) -> usize {
    out.combined().matches("would reformat").count()
}
