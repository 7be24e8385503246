//! Check runner with failure isolation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::check::{Check, CheckBox};
use crate::config::Config;
use crate::context::AuditContext;
use crate::metadata;
use crate::types::CategoryResult;

/// Errors that can occur when setting up a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The audited root does not exist.
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    /// IO error resolving the root.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for configuring a [`CheckRunner`].
#[derive(Default)]
pub struct CheckRunnerBuilder {
    root: Option<PathBuf>,
    package_dir: Option<PathBuf>,
    checks: Vec<CheckBox>,
    config: Option<Config>,
}

impl CheckRunnerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to audit.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Uses `dir` as the package directory instead of discovering it.
    #[must_use]
    pub fn package_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.package_dir = Some(dir.into());
        self
    }

    /// Adds a check.
    #[must_use]
    pub fn check<C: Check + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Adds a boxed check.
    #[must_use]
    pub fn check_box(mut self, check: CheckBox) -> Self {
        self.checks.push(check);
        self
    }

    /// Adds several boxed checks, keeping their order.
    #[must_use]
    pub fn checks(mut self, checks: impl IntoIterator<Item = CheckBox>) -> Self {
        self.checks.extend(checks);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory doesn't exist.
    pub fn build(self) -> Result<CheckRunner, RunnerError> {
        let root = self.root.unwrap_or_else(|| PathBuf::from("."));
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        if !root.is_dir() {
            return Err(RunnerError::RootNotFound(root));
        }

        let package_dir = self
            .package_dir
            .or_else(|| metadata::find_package_dir(&root));

        Ok(CheckRunner {
            ctx: AuditContext::new(root, package_dir),
            checks: self.checks,
            config: self.config.unwrap_or_default(),
        })
    }
}

/// Executes an ordered catalogue of checks against one source tree.
///
/// Use [`CheckRunner::builder()`] to construct an instance.
pub struct CheckRunner {
    ctx: AuditContext,
    checks: Vec<CheckBox>,
    config: Config,
}

impl CheckRunner {
    /// Creates a new builder for configuring a runner.
    #[must_use]
    pub fn builder() -> CheckRunnerBuilder {
        CheckRunnerBuilder::new()
    }

    /// Returns the root directory being audited.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.ctx.root
    }

    /// Returns the context handed to checks.
    #[must_use]
    pub fn context(&self) -> &AuditContext {
        &self.ctx
    }

    /// Returns the number of registered checks.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Returns true if `check` would run under the current configuration.
    #[must_use]
    pub fn is_enabled(&self, check: &dyn Check) -> bool {
        self.config.is_group_enabled(check.group()) && self.config.is_check_enabled(check.name())
    }

    /// Runs every enabled check in order.
    ///
    /// A check that returns an error or panics yields a category holding a
    /// single `check_failed` error; the remaining checks still run.
    #[must_use]
    pub fn run(&self) -> Vec<CategoryResult> {
        info!("Starting audit at {}", self.ctx.root.display());

        let mut categories = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            if !self.is_enabled(check.as_ref()) {
                debug!("Skipping disabled check: {}", check.name());
                continue;
            }
            debug!("Running check: {}", check.name());
            categories.push(self.run_isolated(check.as_ref()));
        }

        info!("Audit complete: {} categories", categories.len());
        categories
    }

    fn run_isolated(&self, check: &dyn Check) -> CategoryResult {
        match panic::catch_unwind(AssertUnwindSafe(|| check.run(&self.ctx))) {
            Ok(Ok(category)) => category,
            Ok(Err(e)) => {
                warn!("Check {} failed: {}", check.name(), e);
                CategoryResult::failed(
                    check.title(),
                    check.tag(),
                    format!("Check could not complete: {e}"),
                )
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Check {} panicked: {}", check.name(), message);
                CategoryResult::failed(
                    check.title(),
                    check.tag(),
                    format!("Check crashed: {message}"),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckError, CheckGroup};

    struct Fixed(&'static str, CheckGroup);

    impl Check for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn title(&self) -> &'static str {
            self.0
        }
        fn tag(&self) -> &'static str {
            "X"
        }
        fn group(&self) -> CheckGroup {
            self.1
        }
        fn run(&self, _ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
            let mut cat = CategoryResult::new(self.title(), self.tag());
            cat.pass("ok", "fine");
            Ok(cat)
        }
    }

    struct Failing;

    impl Check for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn title(&self) -> &'static str {
            "Failing"
        }
        fn tag(&self) -> &'static str {
            "E"
        }
        fn run(&self, _ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
            Err(CheckError::Other("disk on fire".into()))
        }
    }

    struct Panicking;

    impl Check for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn title(&self) -> &'static str {
            "Panicking"
        }
        fn tag(&self) -> &'static str {
            "P"
        }
        fn run(&self, _ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
            panic!("index out of bounds");
        }
    }

    fn runner(config: Config) -> CheckRunner {
        let dir = std::env::temp_dir();
        CheckRunner::builder()
            .root(dir)
            .config(config)
            .check(Fixed("first", CheckGroup::Core))
            .check(Failing)
            .check(Panicking)
            .check(Fixed("net", CheckGroup::Network))
            .check(Fixed("last", CheckGroup::Core))
            .build()
            .unwrap()
    }

    #[test]
    fn isolates_errors_and_panics() {
        let cats = runner(Config::default()).run();
        let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "Failing", "Panicking", "net", "last"]);

        for cat in &cats[1..3] {
            assert_eq!(cat.total(), 1);
            assert_eq!(cat.errors(), 1);
            assert_eq!(cat.results()[0].name, "check_failed");
        }
        assert!(cats[1].results()[0].message.contains("disk on fire"));
        assert!(cats[2].results()[0].message.contains("index out of bounds"));
    }

    #[test]
    fn honours_group_and_check_switches() {
        let mut config = Config::default();
        config.runner.offline = true;
        config.checks.insert(
            "failing".into(),
            crate::config::CheckConfig {
                enabled: Some(false),
            },
        );
        let cats = runner(config).run();
        let names: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "Panicking", "last"]);
    }

    #[test]
    fn missing_root_fails_build() {
        let result = CheckRunner::builder().root("/definitely/not/here").build();
        assert!(matches!(result, Err(RunnerError::RootNotFound(_))));
    }
}
