//! Core types for check results.

use serde::{Deserialize, Serialize};

/// Severity of a single diagnostic outcome.
///
/// Variants are ordered from least to most severe, so `Ord` can be used to
/// pick the worst outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The check passed.
    Pass,
    /// Informational, never fails the audit.
    Info,
    /// Should be addressed; fails only in strict mode.
    Warning,
    /// Must be fixed.
    Error,
}

impl Severity {
    /// Rank used for coloring and scoring (Pass = 0, Error = 3).
    #[must_use]
    pub fn urgency(self) -> u8 {
        match self {
            Self::Pass => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
        }
    }

    /// Four-letter label shown by renderers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "FAIL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One diagnostic outcome inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Identifier, unique within its category (e.g. "pyproject_match").
    pub name: String,
    /// Outcome severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Display name of the owning category.
    pub category: String,
}

/// The results of one check procedure.
///
/// Results can only be appended; counts are always derived from the result
/// list so `total == passed + errors + warnings + infos` holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Display name (e.g. "Versioning").
    pub name: String,
    /// One-letter renderer tag (e.g. "V").
    pub tag: String,
    results: Vec<CheckResult>,
}

impl CategoryResult {
    /// Creates an empty category.
    #[must_use]
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            results: Vec::new(),
        }
    }

    /// Category holding the single `check_failed` error used when a check
    /// could not complete.
    #[must_use]
    pub fn failed(name: impl Into<String>, tag: impl Into<String>, message: impl Into<String>) -> Self {
        let mut category = Self::new(name, tag);
        category.error("check_failed", message);
        category
    }

    /// Appends a result with the given severity.
    pub fn push(&mut self, name: impl Into<String>, severity: Severity, message: impl Into<String>) {
        let result = CheckResult {
            name: name.into(),
            severity,
            message: message.into(),
            category: self.name.clone(),
        };
        self.results.push(result);
    }

    /// Appends a passing result.
    pub fn pass(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.push(name, Severity::Pass, message);
    }

    /// Appends an informational result.
    pub fn info(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.push(name, Severity::Info, message);
    }

    /// Appends a warning.
    pub fn warn(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.push(name, Severity::Warning, message);
    }

    /// Appends an error.
    pub fn error(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.push(name, Severity::Error, message);
    }

    /// Results in the order they were produced.
    #[must_use]
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Finds a result by identifier.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Number of results.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Counts results with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.results.iter().filter(|r| r.severity == severity).count()
    }

    /// Number of passing results.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(Severity::Pass)
    }

    /// Number of errors.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warnings.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of informational results.
    #[must_use]
    pub fn infos(&self) -> usize {
        self.count(Severity::Info)
    }

    /// Severity used to color the category score: Error if any error,
    /// Warning if any warning, otherwise Pass.
    #[must_use]
    pub fn score_severity(&self) -> Severity {
        if self.errors() > 0 {
            Severity::Error
        } else if self.warnings() > 0 {
            Severity::Warning
        } else {
            Severity::Pass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_and_urgency() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::Pass);
        assert_eq!(Severity::Error.urgency(), 3);
        assert_eq!(Severity::Warning.label(), "WARN");
        assert_eq!(Severity::Error.label(), "FAIL");
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn counts_partition_total() {
        let mut cat = CategoryResult::new("Structure", "F");
        cat.pass("a", "ok");
        cat.error("b", "bad");
        cat.warn("c", "meh");
        cat.info("d", "fyi");
        cat.pass("e", "ok");

        assert_eq!(cat.total(), 5);
        assert_eq!(cat.passed(), 2);
        assert_eq!(
            cat.total(),
            cat.passed() + cat.errors() + cat.warnings() + cat.infos()
        );
        assert_eq!(cat.results()[1].category, "Structure");
    }

    #[test]
    fn score_severity_picks_worst_failure() {
        let mut cat = CategoryResult::new("X", "X");
        cat.info("i", "fyi");
        assert_eq!(cat.score_severity(), Severity::Pass);
        cat.warn("w", "meh");
        assert_eq!(cat.score_severity(), Severity::Warning);
        cat.error("e", "bad");
        assert_eq!(cat.score_severity(), Severity::Error);
    }

    #[test]
    fn failed_category_has_single_error() {
        let cat = CategoryResult::failed("Security", "S", "boom");
        assert_eq!(cat.total(), 1);
        assert_eq!(cat.errors(), 1);
        assert_eq!(cat.results()[0].name, "check_failed");
    }
}
