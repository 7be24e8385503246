//! Configuration types for netbox-plugin-audit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::check::CheckGroup;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Treat warnings as failures for the exit code.
    #[serde(default)]
    pub strict: bool,

    /// Which check groups run.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Bounds on external commands and network calls.
    #[serde(default)]
    pub timeouts: Timeouts,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Per-check configurations.
    #[serde(default)]
    pub checks: HashMap<String, CheckConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a check is enabled by its own switch.
    #[must_use]
    pub fn is_check_enabled(&self, name: &str) -> bool {
        self.checks
            .get(name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Checks if a whole group is enabled.
    #[must_use]
    pub fn is_group_enabled(&self, group: CheckGroup) -> bool {
        match group {
            CheckGroup::Core => true,
            CheckGroup::Lint => !self.runner.skip_lint,
            CheckGroup::Build => !self.runner.skip_build,
            CheckGroup::Network => !self.runner.offline,
        }
    }
}

/// Group switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Skip formatter and linter runs.
    #[serde(default)]
    pub skip_lint: bool,

    /// Skip the package build.
    #[serde(default)]
    pub skip_build: bool,

    /// Skip everything that needs the network.
    #[serde(default)]
    pub offline: bool,
}

/// Timeouts in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Shallow clone of a remote source.
    pub clone_secs: u64,
    /// Local git queries.
    pub git_secs: u64,
    /// Each formatter/linter run.
    pub lint_secs: u64,
    /// Package build.
    pub build_secs: u64,
    /// `twine check`.
    pub twine_secs: u64,
    /// Each HTTP request.
    pub http_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            clone_secs: 60,
            git_secs: 5,
            lint_secs: 60,
            build_secs: 120,
            twine_secs: 30,
            http_secs: 10,
        }
    }
}

impl Timeouts {
    /// Clone timeout.
    #[must_use]
    pub fn git_clone(&self) -> Duration {
        Duration::from_secs(self.clone_secs)
    }

    /// Git query timeout.
    #[must_use]
    pub fn git(&self) -> Duration {
        Duration::from_secs(self.git_secs)
    }

    /// Lint tool timeout.
    #[must_use]
    pub fn lint(&self) -> Duration {
        Duration::from_secs(self.lint_secs)
    }

    /// Build timeout.
    #[must_use]
    pub fn build(&self) -> Duration {
        Duration::from_secs(self.build_secs)
    }

    /// Twine timeout.
    #[must_use]
    pub fn twine(&self) -> Duration {
        Duration::from_secs(self.twine_secs)
    }

    /// HTTP timeout.
    #[must_use]
    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }
}

/// External tool locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Python interpreter used for `-m black`, `-m build` and friends.
    pub python: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
        }
    }
}

/// Per-check configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Whether this check is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.strict);
        assert!(config.is_group_enabled(CheckGroup::Network));
        assert_eq!(config.timeouts.build(), Duration::from_secs(120));
        assert_eq!(config.tools.python, "python");
    }

    #[test]
    fn parse_config() {
        let toml = r#"
strict = true

[runner]
skip_lint = true
offline = true

[timeouts]
http_secs = 3

[tools]
python = "python3.12"

[checks.security]
enabled = false
"#;

        let config = Config::parse(toml).unwrap();
        assert!(config.strict);
        assert!(!config.is_group_enabled(CheckGroup::Lint));
        assert!(config.is_group_enabled(CheckGroup::Build));
        assert!(!config.is_group_enabled(CheckGroup::Network));
        assert_eq!(config.timeouts.http_secs, 3);
        assert_eq!(config.timeouts.git_secs, 5);
        assert_eq!(config.tools.python, "python3.12");
        assert!(!config.is_check_enabled("security"));
        assert!(config.is_check_enabled("structure"));
    }

    #[test]
    fn parse_error_is_reported() {
        let err = Config::parse("strict = maybe").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }
}
