//! Check README content and sections.

use std::sync::LazyLock;

use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError, Severity};
use regex::Regex;

use crate::util::{read, regex};

/// Check name for readme.
pub const NAME: &str = "readme";

const MIN_LENGTH: usize = 500;

static SECTIONS: LazyLock<Vec<(&'static str, Regex, Severity)>> = LazyLock::new(|| {
    vec![
        (
            "features",
            regex(r"(?i)(?:^|\n)#{1,3}\s*features"),
            Severity::Warning,
        ),
        (
            "install",
            regex(r"(?i)(?:^|\n)#{1,3}\s*install"),
            Severity::Warning,
        ),
        (
            "configuration",
            regex(r"(?i)PLUGINS_CONFIG|(?:^|\n)#{1,3}\s*config"),
            Severity::Warning,
        ),
        (
            "requirements",
            regex(r"(?i)(?:^|\n)#{1,3}\s*requirements|netbox.*\d+\.\d+|python.*3\.\d+"),
            Severity::Info,
        ),
    ]
});

static BADGE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"!\[.*\]\(.*shields\.io|!\[.*\]\(.*badge|!\[.*\]\(.*img\.shields|<img.*badge")
});

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)!\[.*\]\(.*\.(png|jpg|jpeg|gif)|<img.*src="));

/// Validates README length, key sections, badges and screenshots.
#[derive(Debug, Clone, Default)]
pub struct Readme;

impl Readme {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Readme {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "README"
    }

    fn tag(&self) -> &'static str {
        "R"
    }

    fn description(&self) -> &'static str {
        "README length, features/install/configuration sections, badges, screenshots"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let path = ctx.path("README.md");
        if !path.is_file() {
            cat.error("exists", "README.md not found");
            return Ok(cat);
        }
        let content = read(&path)?;

        let length = content.chars().count();
        if length >= MIN_LENGTH {
            cat.pass("length", format!("README length: {length} chars"));
        } else {
            cat.warn(
                "length",
                format!("README is short ({length} chars, recommend {MIN_LENGTH}+)"),
            );
        }

        for (name, pattern, missing) in SECTIONS.iter() {
            let title = title_case(name);
            if pattern.is_match(&content) {
                cat.pass(*name, format!("{title} section found"));
            } else {
                cat.push(*name, *missing, format!("{title} section not found"));
            }
        }

        if BADGE.is_match(&content) {
            cat.pass("badges", "Badge(s) found");
        } else {
            cat.info(
                "badges",
                "No badges found (consider adding version/license badges)",
            );
        }

        if IMAGE.is_match(&content) {
            cat.pass("screenshots", "Screenshots/images found");
        } else {
            cat.info("screenshots", "No screenshots found");
        }

        Ok(cat)
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
