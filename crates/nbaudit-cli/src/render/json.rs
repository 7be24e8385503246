//! Machine-readable JSON report.

use anyhow::Result;
use nbaudit::{AuditReport, CategoryResult, Severity, Summary};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    plugin_name: &'a str,
    version: Option<&'a str>,
    summary: &'a Summary,
    categories: Vec<JsonCategory<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonCategory<'a> {
    name: &'a str,
    passed: usize,
    total: usize,
    checks: Vec<JsonCheck<'a>>,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    name: &'a str,
    severity: Severity,
    message: &'a str,
}

impl<'a> From<&'a CategoryResult> for JsonCategory<'a> {
    fn from(cat: &'a CategoryResult) -> Self {
        Self {
            name: &cat.name,
            passed: cat.passed(),
            total: cat.total(),
            checks: cat
                .results()
                .iter()
                .map(|r| JsonCheck {
                    name: &r.name,
                    severity: r.severity,
                    message: &r.message,
                })
                .collect(),
        }
    }
}

/// Renders `report` as pretty-printed JSON.
pub fn render(report: &AuditReport) -> Result<String> {
    let view = JsonReport {
        plugin_name: &report.subject_name,
        version: report.version.as_deref(),
        summary: &report.summary,
        categories: report.categories.iter().map(JsonCategory::from).collect(),
        error: report.fatal_error.as_deref(),
    };
    Ok(serde_json::to_string_pretty(&view)?)
}
