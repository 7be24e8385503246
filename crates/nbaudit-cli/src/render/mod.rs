//! Report renderers.

mod json;
mod markdown;
mod palette;
mod terminal;

pub use json::render as json;
pub use markdown::render as markdown;
pub use palette::Palette;
pub use terminal::render as terminal;

use nbaudit::AuditReport;

/// `v1.2.3`, or `unknown` when no version was resolved.
fn version_label(report: &AuditReport) -> String {
    report
        .version
        .as_deref()
        .map_or_else(|| "unknown".to_owned(), |v| format!("v{v}"))
}
