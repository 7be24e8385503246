//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# netbox-plugin-audit configuration

# Exit with code 1 on warnings as well as errors
strict = false

[runner]
# Skip ruff/black/isort/flake8
skip_lint = false
# Skip `python -m build` and `twine check`
skip_build = false
# Skip GitHub and PyPI lookups
offline = false

[timeouts]
clone_secs = 60
git_secs = 5
lint_secs = 60
build_secs = 120
twine_secs = 30
http_secs = 10

[tools]
# Interpreter used for `-m black`, `-m build` and friends
python = "python"

# Individual checks can be switched off by name (see `list-checks`)
# [checks.security]
# enabled = false
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("nbaudit.toml");
    write_config(config_path, force)?;

    println!("Created nbaudit.toml");
    println!("\nNext steps:");
    println!("  1. Edit nbaudit.toml to configure checks");
    println!("  2. Run: netbox-plugin-audit audit .");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbaudit::Config;

    #[test]
    fn default_config_parses_to_defaults() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(config.strict, defaults.strict);
        assert_eq!(config.timeouts.build_secs, defaults.timeouts.build_secs);
        assert_eq!(config.tools.python, defaults.tools.python);
        assert!(config.checks.is_empty());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nbaudit.toml");
        std::fs::write(&path, "strict = true\n").unwrap();

        let err = write_config(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "strict = true\n");

        write_config(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
