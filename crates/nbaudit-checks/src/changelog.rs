//! Check the changelog against the Keep a Changelog conventions.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use nbaudit_core::metadata::{find_changelog, version_entries};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use regex::Regex;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::util::{read, regex};

/// Check name for changelog.
pub const NAME: &str = "changelog";

/// Oldest year accepted in a release date.
const MIN_YEAR: i32 = 2000;

static UNRELEASED: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)##\s*\[?Unreleased\]?"));
static SUBSECTION: LazyLock<Regex> =
    LazyLock::new(|| regex(r"###\s*(Added|Fixed|Changed|Removed|Deprecated|Security)"));

/// Validates header, Unreleased section, dated entries, subsections and the
/// format reference.
#[derive(Debug, Clone, Default)]
pub struct Changelog;

impl Changelog {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Changelog {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "CHANGELOG"
    }

    fn tag(&self) -> &'static str {
        "L"
    }

    fn description(&self) -> &'static str {
        "Keep a Changelog header, Unreleased, dated versions and subsections"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let Some(path) = find_changelog(&ctx.root) else {
            cat.warn("exists", "CHANGELOG.md not found");
            return Ok(cat);
        };
        let content = read(&path)?;

        let first = content.trim().lines().next().unwrap_or_default().trim();
        if first.starts_with("# Changelog") {
            cat.pass("header", "Starts with # Changelog");
        } else if first.starts_with("# ") {
            cat.info("header", format!("Header: {first} (expected # Changelog)"));
        } else {
            cat.warn("header", "Missing # Changelog header");
        }

        if UNRELEASED.is_match(&content) {
            cat.pass("unreleased", "[Unreleased] section found");
        } else {
            cat.info("unreleased", "No [Unreleased] section");
        }

        check_versions(&mut cat, &content);

        let subsections: BTreeSet<&str> = SUBSECTION
            .captures_iter(&content)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        if subsections.is_empty() {
            cat.info(
                "subsections",
                "No standard subsections (Added, Fixed, Changed, etc.)",
            );
        } else {
            let used: Vec<&str> = subsections.into_iter().collect();
            cat.pass("subsections", format!("Subsections used: {}", used.join(", ")));
        }

        let lower = content.to_lowercase();
        if lower.contains("keepachangelog") || lower.contains("keep a changelog") {
            cat.pass("format_ref", "References Keep a Changelog format");
        } else {
            cat.info("format_ref", "No reference to Keep a Changelog format");
        }

        Ok(cat)
    }
}

fn check_versions(cat: &mut CategoryResult, content: &str) {
    let entries = version_entries(content);
    let dated: Vec<&str> = entries.iter().filter_map(|e| e.date.as_deref()).collect();

    if dated.is_empty() {
        if entries.is_empty() {
            cat.warn("versions", "No version entries found");
        } else {
            cat.warn(
                "versions",
                format!(
                    "{} versions found but missing dates (expected ## [X.Y.Z] - YYYY-MM-DD)",
                    entries.len()
                ),
            );
        }
        return;
    }

    cat.pass("versions", format!("{} version entries found", dated.len()));

    let max_year = OffsetDateTime::now_utc().year() + 1;
    let invalid: Vec<&str> = dated
        .into_iter()
        .filter(|d| !is_valid_release_date(d, max_year))
        .collect();
    if invalid.is_empty() {
        cat.pass("dates", "All dates are valid YYYY-MM-DD");
    } else {
        cat.warn(
            "dates",
            format!("Some dates may be invalid: {}", invalid.join(", ")),
        );
    }
}

/// A real calendar date no older than [`MIN_YEAR`] and no later than `max_year`.
fn is_valid_release_date(date: &str, max_year: i32) -> bool {
    Date::parse(date, format_description!("[year]-[month]-[day]"))
        .is_ok_and(|d| (MIN_YEAR..=max_year).contains(&d.year()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use nbaudit_core::Severity;

    const GOOD: &str = "# Changelog\n\nAll notable changes follow [Keep a Changelog](https://keepachangelog.com).\n\n\
                        ## [Unreleased]\n\n## [1.1.0] - 2025-03-01\n\n### Added\n\n- x\n\n\
                        ## [1.0.0] - 2024-12-31\n\n### Fixed\n\n- y\n";

    #[test]
    fn well_formed_changelog_passes() {
        let (_dir, ctx) = fixture(&[("CHANGELOG.md", GOOD)]);
        let cat = Changelog::new().run(&ctx).unwrap();
        assert_eq!(cat.passed(), cat.total(), "{cat:#?}");
        assert_eq!(cat.get("versions").unwrap().message, "2 version entries found");
        assert_eq!(
            cat.get("subsections").unwrap().message,
            "Subsections used: Added, Fixed"
        );
    }

    #[test]
    fn impossible_dates_warn() {
        let content = "# Changelog\n\n## [1.0.1] - 2024-02-30\n\n## [1.0.0] - 1999-01-01\n";
        let (_dir, ctx) = fixture(&[("CHANGELOG.md", content)]);
        let cat = Changelog::new().run(&ctx).unwrap();
        let dates = cat.get("dates").unwrap();
        assert_eq!(dates.severity, Severity::Warning);
        assert_eq!(
            dates.message,
            "Some dates may be invalid: 2024-02-30, 1999-01-01"
        );
    }

    #[test]
    fn undated_versions_and_foreign_header() {
        let content = "# Release notes\n\n## [0.2.0]\n\n## [0.1.0]\n";
        let (_dir, ctx) = fixture(&[("CHANGES.md", content)]);
        let cat = Changelog::new().run(&ctx).unwrap();
        assert_eq!(cat.get("header").unwrap().severity, Severity::Info);
        assert_eq!(
            cat.get("versions").unwrap().message,
            "2 versions found but missing dates (expected ## [X.Y.Z] - YYYY-MM-DD)"
        );
        assert!(cat.get("dates").is_none());
        assert_eq!(cat.get("unreleased").unwrap().severity, Severity::Info);
    }

    #[test]
    fn missing_changelog_warns_once() {
        let (_dir, ctx) = fixture(&[]);
        let cat = Changelog::new().run(&ctx).unwrap();
        assert_eq!(cat.total(), 1);
        assert_eq!(cat.warnings(), 1);
    }

    #[test]
    fn release_date_bounds() {
        assert!(is_valid_release_date("2024-02-29", 2026));
        assert!(!is_valid_release_date("2023-02-29", 2026));
        assert!(!is_valid_release_date("2030-01-01", 2026));
    }
}
