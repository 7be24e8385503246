//! Turning a source argument into a local directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nbaudit_core::process::{run_tool, ToolOutcome};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "git@"];

/// Where the plugin under audit lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditSource {
    /// A directory on disk.
    Local(PathBuf),
    /// A git URL cloned into a temporary directory.
    Remote(String),
}

/// Failure to obtain a local tree. Always fatal for the run.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The local path does not exist or is not a directory.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// `git clone` exited unsuccessfully.
    #[error("Failed to clone {url}")]
    CloneFailed {
        /// Source URL.
        url: String,
        /// Tool output, for logging.
        detail: String,
    },

    /// `git clone` exceeded its timeout.
    #[error("Timed out cloning {url} after {secs}s")]
    CloneTimedOut {
        /// Source URL.
        url: String,
        /// Timeout that was hit.
        secs: u64,
    },

    /// `git` is not on `PATH`.
    #[error("git is not installed, cannot clone {0}")]
    GitMissing(String),

    /// IO error creating the temporary directory or running git.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A checked-out tree; a cloned tree is removed when this is dropped.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    _clone: Option<TempDir>,
}

impl Workspace {
    /// Root directory to audit.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AuditSource {
    /// Classifies a command-line argument.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        if REMOTE_PREFIXES.iter().any(|p| arg.starts_with(p)) {
            Self::Remote(arg.to_owned())
        } else {
            Self::Local(PathBuf::from(arg))
        }
    }

    /// Human-readable form of the source as given.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }

    /// Name used when no package directory is found.
    ///
    /// The last path component, or the repository name of a URL without `.git`.
    #[must_use]
    pub fn base_name(&self) -> String {
        match self {
            Self::Local(path) => std::path::absolute(path)
                .ok()
                .as_deref()
                .and_then(Path::file_name)
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            Self::Remote(url) => {
                let trimmed = url.trim_end_matches('/');
                let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
                last.strip_suffix(".git").unwrap_or(last).to_owned()
            }
        }
    }

    /// Makes the source available locally.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError`] when a local path is missing or a clone fails.
    pub fn acquire(&self, clone_timeout: Duration) -> Result<Workspace, AcquireError> {
        match self {
            Self::Local(path) => {
                if !path.is_dir() {
                    return Err(AcquireError::NotFound(path.clone()));
                }
                Ok(Workspace {
                    root: path.clone(),
                    _clone: None,
                })
            }
            Self::Remote(url) => clone(url, clone_timeout),
        }
    }
}

fn clone(url: &str, timeout: Duration) -> Result<Workspace, AcquireError> {
    let dir = tempfile::Builder::new().prefix("nbaudit_").tempdir()?;
    let dest = dir.path().to_string_lossy().into_owned();
    info!("Cloning {} into {}", url, dest);

    match run_tool(
        "git",
        &["clone", "--depth", "1", url, &dest],
        &std::env::temp_dir(),
        timeout,
    )? {
        ToolOutcome::Completed(out) if out.success() => Ok(Workspace {
            root: dir.path().to_path_buf(),
            _clone: Some(dir),
        }),
        ToolOutcome::Completed(out) => {
            let detail = out.combined();
            debug!("git clone failed: {}", detail.trim());
            Err(AcquireError::CloneFailed {
                url: url.to_owned(),
                detail,
            })
        }
        ToolOutcome::TimedOut => Err(AcquireError::CloneTimedOut {
            url: url.to_owned(),
            secs: timeout.as_secs(),
        }),
        ToolOutcome::NotInstalled => Err(AcquireError::GitMissing(url.to_owned())),
    }
}
