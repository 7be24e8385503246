//! Helpers shared by check bodies.

use std::path::Path;

use nbaudit_core::CheckError;
use regex::Regex;

/// Compiles a literal pattern.
#[allow(clippy::expect_used)]
pub(crate) fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex")
}

/// Shortens `s` to `max` characters, appending `...` when cut.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_owned()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Reads a file that is known to exist; failures are unexpected faults.
pub(crate) fn read(path: &Path) -> Result<String, CheckError> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|e| CheckError::io(path, e))
}

/// Dotted-name helper: `a.b.C` gives `C`.
pub(crate) fn last_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}
