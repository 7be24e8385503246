use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Changelog locations, tried in order.
pub const CHANGELOG_CANDIDATES: &[&str] = &[
    "CHANGELOG.md",
    "CHANGES.md",
    "HISTORY.md",
    "docs/CHANGELOG.md",
    "docs/changelog.md",
];

#[allow(clippy::expect_used)]
static VERSION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##\s*\[(\d+\.\d+\.\d+)\](?:\s*-\s*(\d{4}-\d{2}-\d{2}))?")
        .expect("Invalid regex")
});

/// A released version heading such as `## [1.2.0] - 2024-05-01`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// `X.Y.Z`
    pub version: String,
    /// `YYYY-MM-DD`, when the heading is dated.
    pub date: Option<String>,
}

/// First existing changelog file under `root`.
#[must_use]
pub fn find_changelog(root: &Path) -> Option<PathBuf> {
    CHANGELOG_CANDIDATES
        .iter()
        .map(|c| root.join(c))
        .find(|p| p.is_file())
}

/// All `## [X.Y.Z]` headings in document order.
#[must_use]
pub fn version_entries(content: &str) -> Vec<ChangelogEntry> {
    VERSION_HEADING
        .captures_iter(content)
        .map(|c| ChangelogEntry {
            version: c[1].to_owned(),
            date: c.get(2).map(|m| m.as_str().to_owned()),
        })
        .collect()
}

/// Latest released version: the first dated heading, or the first heading
/// when none is dated.
#[must_use]
pub fn changelog_version(root: &Path) -> Option<String> {
    let path = find_changelog(root)?;
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    latest_version(&content)
}

fn latest_version(content: &str) -> Option<String> {
    let entries = version_entries(content);
    entries
        .iter()
        .find(|e| e.date.is_some())
        .or_else(|| entries.first())
        .map(|e| e.version.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn prefers_dated_heading() {
        let content = "# Changelog\n\n## [2.0.0]\n\n## [1.9.0] - 2024-03-01\n";
        assert_eq!(latest_version(content).as_deref(), Some("1.9.0"));
    }

    #[test]
    fn falls_back_to_first_undated() {
        let content = "## [Unreleased]\n\n## [0.3.0]\n\n## [0.2.0]\n";
        assert_eq!(latest_version(content).as_deref(), Some("0.3.0"));
    }

    #[test]
    fn ignores_unreleased_and_prose() {
        let content = "## [Unreleased]\nSee ## [9.9.9] inline\n";
        assert_eq!(latest_version(content), None);
    }

    #[test]
    fn entries_capture_dates() {
        let entries = version_entries("## [1.0.0] - 2024-01-02\n## [0.9.0]\n");
        assert_eq!(
            entries,
            vec![
                ChangelogEntry {
                    version: "1.0.0".into(),
                    date: Some("2024-01-02".into())
                },
                ChangelogEntry {
                    version: "0.9.0".into(),
                    date: None
                },
            ]
        );
    }

    #[test]
    fn locates_docs_changelog() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/changelog.md"), "## [1.1.0] - 2025-01-01\n").unwrap();
        assert_eq!(changelog_version(dir.path()).as_deref(), Some("1.1.0"));
    }

    #[test]
    fn root_changelog_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/CHANGELOG.md"), "## [1.0.0]\n").unwrap();
        fs::write(dir.path().join("HISTORY.md"), "## [2.0.0]\n").unwrap();
        assert_eq!(
            find_changelog(dir.path()).unwrap().file_name().unwrap(),
            "HISTORY.md"
        );
    }
}
