//! Markdown report, for pull request comments and issues.

use nbaudit::{AuditReport, Severity};

use super::version_label;

fn icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Pass => "✅",
        Severity::Info => "ℹ️",
        Severity::Warning => "⚠️",
        Severity::Error => "❌",
    }
}

/// Renders `report` as a Markdown document.
#[must_use]
pub fn render(report: &AuditReport) -> String {
    let mut lines = vec![
        format!(
            "# NetBox Plugin Audit: {} ({})",
            report.subject_name,
            version_label(report)
        ),
        String::new(),
    ];

    if let Some(error) = &report.fatal_error {
        lines.push(format!("**ERROR:** {error}"));
        return lines.join("\n");
    }

    let s = &report.summary;
    lines.push(format!(
        "**Score: {}/{} ({}%)**",
        s.passed,
        s.total,
        s.pass_percent()
    ));
    lines.push(format!(
        "Errors: {} | Warnings: {} | Info: {}",
        s.errors, s.warnings, s.infos
    ));

    for cat in &report.categories {
        lines.push(String::new());
        lines.push(format!("## {} ({}/{})", cat.name, cat.passed(), cat.total()));
        lines.push(String::new());
        for result in cat.results() {
            lines.push(format!("- {} {}", icon(result.severity), result.message));
        }
    }

    lines.join("\n")
}
