//! Human-readable terminal report.

use nbaudit::{AuditReport, Severity};

use super::{version_label, Palette};

const RULE_WIDTH: usize = 58;
const HEADER_WIDTH: usize = 45;

/// Renders `report` with the colors and icons of `palette`.
#[must_use]
pub fn render(report: &AuditReport, palette: &Palette) -> String {
    let p = palette;
    let mut lines = Vec::new();

    lines.push(String::new());
    lines.push(format!("{}{}{}", p.bold, "═".repeat(RULE_WIDTH), p.reset));
    lines.push(format!("{}  NetBox Plugin Audit Report{}", p.bold, p.reset));
    lines.push(format!(
        "{}  Plugin: {} ({}){}",
        p.bold,
        report.subject_name,
        version_label(report),
        p.reset
    ));
    lines.push(format!("{}{}{}", p.bold, "═".repeat(RULE_WIDTH), p.reset));
    lines.push(String::new());

    if let Some(error) = &report.fatal_error {
        lines.push(format!("  {}ERROR: {error}{}", p.red, p.reset));
        lines.push(String::new());
        return lines.join("\n");
    }

    for cat in &report.categories {
        let header = format!("{} {}", p.icon(&cat.tag), cat.name);
        let score_color = match cat.score_severity() {
            Severity::Error => p.red,
            Severity::Warning => p.yellow,
            Severity::Pass | Severity::Info => p.green,
        };
        lines.push(format!(
            "  {}{header:<width$}{} {score_color}{}/{}{}",
            p.bold,
            p.reset,
            cat.passed(),
            cat.total(),
            p.reset,
            width = HEADER_WIDTH
        ));
        for result in cat.results() {
            lines.push(format!("    {}  {}", p.label(result.severity), result.message));
        }
        lines.push(String::new());
    }

    let s = &report.summary;
    lines.push(format!("  {}{}{}", p.bold, "─".repeat(RULE_WIDTH), p.reset));
    lines.push(format!(
        "  {}Summary:{} {}{}/{} checks passed ({}%){}",
        p.bold,
        p.reset,
        p.band(s.band()),
        s.passed,
        s.total,
        s.pass_percent(),
        p.reset
    ));
    lines.push(format!(
        "    {}Errors: {}{} | {}Warnings: {}{} | {}Info: {}{}",
        p.red, s.errors, p.reset, p.yellow, s.warnings, p.reset, p.cyan, s.infos, p.reset
    ));
    lines.push(String::new());

    lines.join("\n")
}
