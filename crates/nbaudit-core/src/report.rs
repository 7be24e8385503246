//! Report aggregation and scoring.

use serde::{Deserialize, Serialize};

use crate::types::{CategoryResult, Severity};

/// Report-wide result counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of results.
    pub total: usize,
    /// Passing results.
    pub passed: usize,
    /// Errors.
    pub errors: usize,
    /// Warnings.
    pub warnings: usize,
    /// Informational results.
    pub infos: usize,
}

/// Coarse quality band for the pass percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 90% and above.
    Good,
    /// 70% to 89%.
    Fair,
    /// Below 70%.
    Poor,
}

impl Summary {
    /// Sums each count field across `categories`.
    #[must_use]
    pub fn from_categories(categories: &[CategoryResult]) -> Self {
        categories.iter().fold(Self::default(), |acc, c| Self {
            total: acc.total + c.total(),
            passed: acc.passed + c.passed(),
            errors: acc.errors + c.errors(),
            warnings: acc.warnings + c.warnings(),
            infos: acc.infos + c.infos(),
        })
    }

    /// Share of passing results, rounded half away from zero; 0 when empty.
    #[must_use]
    pub fn pass_percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        (200 * self.passed + self.total) / (2 * self.total)
    }

    /// Band for the pass percentage.
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        match self.pass_percent() {
            90.. => ScoreBand::Good,
            70..=89 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

/// The outcome of auditing one plugin source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Package directory name, or the source's base name.
    pub subject_name: String,
    /// Resolved plugin version.
    pub version: Option<String>,
    /// Categories in catalogue order.
    pub categories: Vec<CategoryResult>,
    /// Aggregated counts.
    pub summary: Summary,
    /// Set only when the audit could not run at all.
    pub fatal_error: Option<String>,
}

impl AuditReport {
    /// Builds a report, deriving the summary from `categories`.
    #[must_use]
    pub fn new(
        subject_name: impl Into<String>,
        version: Option<String>,
        categories: Vec<CategoryResult>,
    ) -> Self {
        let summary = Summary::from_categories(&categories);
        Self {
            subject_name: subject_name.into(),
            version,
            categories,
            summary,
            fatal_error: None,
        }
    }

    /// Report for a run that never reached the checks.
    ///
    /// The summary carries one synthetic error while `total` stays 0, matching
    /// the empty category list.
    #[must_use]
    pub fn fatal(subject_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            version: None,
            categories: Vec::new(),
            summary: Summary {
                errors: 1,
                ..Summary::default()
            },
            fatal_error: Some(message.into()),
        }
    }

    /// Returns true if a fatal error occurred.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.fatal_error.is_some()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }

    /// Worst severity present in the report.
    #[must_use]
    pub fn worst_severity(&self) -> Severity {
        self.categories
            .iter()
            .flat_map(CategoryResult::results)
            .map(|r| r.severity)
            .max()
            .unwrap_or(if self.is_fatal() {
                Severity::Error
            } else {
                Severity::Pass
            })
    }

    /// Process exit status: 1 on fatal error, any error, or (strict) any
    /// warning; otherwise 0.
    #[must_use]
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.is_fatal() || self.has_errors() || (strict && self.has_warnings()) {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, severities: &[Severity]) -> CategoryResult {
        let mut cat = CategoryResult::new(name, &name[..1]);
        for (i, s) in severities.iter().enumerate() {
            cat.push(format!("r{i}"), *s, "msg");
        }
        cat
    }

    #[test]
    fn summary_sums_categories() {
        let cats = vec![
            category("A", &[Severity::Pass, Severity::Error]),
            category("B", &[Severity::Warning, Severity::Info, Severity::Pass]),
        ];
        let s = Summary::from_categories(&cats);
        assert_eq!(
            s,
            Summary {
                total: 5,
                passed: 2,
                errors: 1,
                warnings: 1,
                infos: 1
            }
        );
        assert_eq!(s.total, cats.iter().map(CategoryResult::total).sum::<usize>());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let cats = vec![category("A", &[Severity::Pass, Severity::Warning])];
        assert_eq!(Summary::from_categories(&cats), Summary::from_categories(&cats));
    }

    #[test]
    fn pass_percent_rounds_half_away_from_zero() {
        let s = |passed, total| Summary {
            total,
            passed,
            ..Summary::default()
        };
        assert_eq!(s(0, 0).pass_percent(), 0);
        assert_eq!(s(1, 8).pass_percent(), 13); // 12.5
        assert_eq!(s(2, 3).pass_percent(), 67);
        assert_eq!(s(1, 3).pass_percent(), 33);
        assert_eq!(s(5, 5).pass_percent(), 100);
    }

    #[test]
    fn bands() {
        let s = |passed| Summary {
            total: 100,
            passed,
            ..Summary::default()
        };
        assert_eq!(s(90).band(), ScoreBand::Good);
        assert_eq!(s(89).band(), ScoreBand::Fair);
        assert_eq!(s(70).band(), ScoreBand::Fair);
        assert_eq!(s(69).band(), ScoreBand::Poor);
    }

    #[test]
    fn fatal_report_shape() {
        let report = AuditReport::fatal("missing", "Path not found: missing");
        assert!(report.categories.is_empty());
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.exit_code(false), 1);
        assert_eq!(report.worst_severity(), Severity::Error);
    }

    #[test]
    fn exit_code_policy() {
        let clean = AuditReport::new("p", None, vec![category("A", &[Severity::Pass, Severity::Info])]);
        assert_eq!(clean.exit_code(true), 0);

        let warned = AuditReport::new("p", None, vec![category("A", &[Severity::Warning])]);
        assert_eq!(warned.exit_code(false), 0);
        assert_eq!(warned.exit_code(true), 1);

        let failed = AuditReport::new("p", None, vec![category("A", &[Severity::Error])]);
        assert_eq!(failed.exit_code(false), 1);
    }
}
