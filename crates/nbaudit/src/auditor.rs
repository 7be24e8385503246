//! End-to-end audit of one plugin source.

use nbaudit_checks::default_catalog;
use nbaudit_core::{AuditReport, CheckBox, CheckRunner, Config};
use tracing::{info, warn};

use crate::source::AuditSource;

/// Audits `source` with the built-in catalogue.
///
/// Never fails: acquisition problems become a report with `fatal_error` set.
#[must_use]
pub fn audit(source: &AuditSource, config: &Config) -> AuditReport {
    audit_with(source, config, default_catalog(config))
}

/// Audits `source` with an explicit list of checks.
#[must_use]
pub fn audit_with(source: &AuditSource, config: &Config, checks: Vec<CheckBox>) -> AuditReport {
    let workspace = match source.acquire(config.timeouts.git_clone()) {
        Ok(ws) => ws,
        Err(e) => {
            warn!("Cannot audit {}: {}", source.display(), e);
            return AuditReport::fatal(source.display(), e.to_string());
        }
    };
    let root = workspace.root();

    let runner = match CheckRunner::builder()
        .root(root)
        .config(config.clone())
        .checks(checks)
        .build()
    {
        Ok(runner) => runner,
        Err(e) => return AuditReport::fatal(source.base_name(), e.to_string()),
    };

    let meta = &runner.context().metadata;
    let subject = meta
        .package_name()
        .map_or_else(|| source.base_name(), str::to_owned);
    info!("Auditing {} ({:?})", subject, meta.version.value);

    let version = meta.version.value.clone();
    AuditReport::new(subject, version, runner.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbaudit_checks::core_checks;

    #[test]
    fn missing_path_is_fatal() {
        let report = audit(&AuditSource::parse("/definitely/not/here"), &Config::default());
        assert!(report.is_fatal());
        assert_eq!(report.fatal_error.as_deref(), Some("Path not found: /definitely/not/here"));
        assert!(report.categories.is_empty());
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.exit_code(false), 1);
    }

    #[test]
    fn subject_falls_back_to_directory_name() {
        let dir = tempfile::Builder::new().prefix("plugin-src").tempdir().unwrap();
        let source = AuditSource::Local(dir.path().to_path_buf());
        let report = audit_with(&source, &Config::default(), core_checks());
        assert!(report.subject_name.starts_with("plugin-src"));
        assert_eq!(report.version, None);
        assert_eq!(report.categories.len(), 10);
    }
}
