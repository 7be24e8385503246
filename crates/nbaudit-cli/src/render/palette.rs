//! Terminal colors and category icons.

use nbaudit::{ScoreBand, Severity};

/// Read-only styling handed to the terminal renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bold: &'static str,
    pub reset: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub red: &'static str,
    pub cyan: &'static str,
    icons: bool,
}

impl Palette {
    /// ANSI colors with emoji category icons.
    #[must_use]
    pub const fn ansi() -> Self {
        Self {
            bold: "\x1b[1m",
            reset: "\x1b[0m",
            green: "\x1b[32m",
            yellow: "\x1b[33m",
            red: "\x1b[31m",
            cyan: "\x1b[36m",
            icons: true,
        }
    }

    /// No escape codes; tags shown as `[F]`.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            bold: "",
            reset: "",
            green: "",
            yellow: "",
            red: "",
            cyan: "",
            icons: false,
        }
    }

    /// Color for a severity.
    #[must_use]
    pub fn severity(&self, severity: Severity) -> &'static str {
        match severity {
            Severity::Pass => self.green,
            Severity::Info => self.cyan,
            Severity::Warning => self.yellow,
            Severity::Error => self.red,
        }
    }

    /// Color for a pass-percentage band.
    #[must_use]
    pub fn band(&self, band: ScoreBand) -> &'static str {
        match band {
            ScoreBand::Good => self.green,
            ScoreBand::Fair => self.yellow,
            ScoreBand::Poor => self.red,
        }
    }

    /// Colored four-letter severity label.
    #[must_use]
    pub fn label(&self, severity: Severity) -> String {
        format!("{}{}{}", self.severity(severity), severity.label(), self.reset)
    }

    /// Icon for a category tag.
    #[must_use]
    pub fn icon(&self, tag: &str) -> String {
        if !self.icons {
            return format!("[{tag}]");
        }
        let icon = match tag {
            "F" => "📁",
            "C" => "⚙️ ",
            "P" => "📦",
            "V" => "🔢",
            "L" => "📋",
            "R" => "📖",
            "D" => "🧩",
            "W" => "🔧",
            "S" => "🔒",
            "T" => "🏅",
            "G" => "🐙",
            "Q" => "🔍",
            "B" => "🏗️ ",
            _ => "📌",
        };
        icon.to_owned()
    }
}
