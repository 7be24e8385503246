//! The check trait implemented by every audit category.

use std::path::PathBuf;

use crate::context::AuditContext;
use crate::types::CategoryResult;

/// Coarse grouping used to switch whole families of checks on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckGroup {
    /// File and source inspection only.
    Core,
    /// Runs external formatters and linters.
    Lint,
    /// Builds the package.
    Build,
    /// Talks to remote services.
    Network,
}

impl std::fmt::Display for CheckGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Lint => write!(f, "lint"),
            Self::Build => write!(f, "build"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Unexpected fault inside a check body.
///
/// Expected conditions (missing files, unparseable sources, unavailable
/// tools) are reported as results instead. Anything returned here is
/// contained by the runner and becomes a single `check_failed` error.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// IO error reading a file.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Malformed TOML where the check required it to be valid.
    #[error("Failed to parse {path}: {message}")]
    Toml {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A subprocess could not be managed.
    #[error("Failed to run {tool}: {source}")]
    Process {
        /// Program name.
        tool: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl CheckError {
    /// Wraps an IO error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A diagnostic procedure producing one result category.
///
/// Implementations must be total: missing preconditions (no package
/// directory, no manifest) are reported as results, not errors.
///
/// # Example
///
/// ```ignore
/// use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
///
/// pub struct HasLicense;
///
/// impl Check for HasLicense {
///     fn name(&self) -> &'static str { "license" }
///     fn title(&self) -> &'static str { "License" }
///     fn tag(&self) -> &'static str { "X" }
///
///     fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
///         let mut cat = CategoryResult::new(self.title(), self.tag());
///         if ctx.exists("LICENSE") {
///             cat.pass("license", "LICENSE found");
///         } else {
///             cat.error("license", "LICENSE not found");
///         }
///         Ok(cat)
///     }
/// }
/// ```
pub trait Check: Send + Sync {
    /// Kebab-case identifier used in configuration (e.g. "plugin-config").
    fn name(&self) -> &'static str;

    /// Category display name (e.g. "PluginConfig").
    fn title(&self) -> &'static str;

    /// One-letter tag used by renderers.
    fn tag(&self) -> &'static str;

    /// Group used for bulk enable/disable.
    fn group(&self) -> CheckGroup {
        CheckGroup::Core
    }

    /// Returns a brief description of what this check inspects.
    fn description(&self) -> &'static str {
        ""
    }

    /// Runs the check against the audited tree.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] on unexpected faults only.
    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError>;
}

/// Type alias for boxed Check trait objects.
pub type CheckBox = Box<dyn Check>;
