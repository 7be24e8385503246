//! Effective settings for one audit run.
//!
//! A config file is layered under the command-line switches. The file is the
//! `--config` path when given, otherwise the first of `nbaudit.toml`,
//! `.nbaudit.toml` (working directory) or `config.toml` in the user config
//! directory that exists. Switches can only turn a setting on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nbaudit::Config;
use tracing::{debug, info};

/// Config file names looked up in the working directory.
const LOCAL_FILES: &[&str] = &["nbaudit.toml", ".nbaudit.toml"];

/// Audit switches given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Switches {
    pub strict: bool,
    pub skip_lint: bool,
    pub skip_build: bool,
    pub offline: bool,
}

impl Switches {
    fn apply(self, config: &mut Config) {
        config.strict |= self.strict;
        config.runner.skip_lint |= self.skip_lint;
        config.runner.skip_build |= self.skip_build;
        config.runner.offline |= self.offline;
    }
}

/// The configuration an audit runs with.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    /// The file `config` was read from; `None` means built-in defaults.
    pub file: Option<PathBuf>,
}

/// Loads settings for an audit started in `cwd`.
///
/// # Errors
///
/// Fails if the chosen config file cannot be read or parsed.
pub fn load(cwd: &Path, explicit: Option<&Path>, switches: Switches) -> Result<Settings> {
    load_with(cwd, explicit, user_config_dir().as_deref(), switches)
}

fn load_with(
    cwd: &Path,
    explicit: Option<&Path>,
    user_dir: Option<&Path>,
    switches: Switches,
) -> Result<Settings> {
    let file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover(cwd, user_dir),
    };

    let mut config = match &file {
        Some(path) => {
            info!("Using config: {}", path.display());
            Config::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => {
            debug!("No config file found, using defaults");
            Config::default()
        }
    };
    switches.apply(&mut config);

    Ok(Settings { config, file })
}

fn discover(cwd: &Path, user_dir: Option<&Path>) -> Option<PathBuf> {
    LOCAL_FILES
        .iter()
        .map(|name| cwd.join(name))
        .chain(user_dir.map(|dir| dir.join("config.toml")))
        .find(|path| path.is_file())
}

/// `$NBAUDIT_CONFIG_DIR`, else `~/.nbaudit`.
fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("NBAUDIT_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|h| h.join(".nbaudit")))
}
