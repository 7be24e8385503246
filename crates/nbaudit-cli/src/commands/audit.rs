//! Audit command implementation.

use std::io::IsTerminal;

use anyhow::Result;
use nbaudit::{audit, AuditSource};

use crate::render::{self, Palette};
use crate::settings::Settings;
use crate::OutputFormat;

/// Output flags given to `audit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub format: OutputFormat,
    pub no_color: bool,
}

impl Options {
    fn palette(&self) -> Palette {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if self.no_color || no_color_env || !std::io::stdout().is_terminal() {
            Palette::plain()
        } else {
            Palette::ansi()
        }
    }
}

/// Runs the audit command.
pub fn run(source: &str, options: &Options, settings: &Settings) -> Result<()> {
    let config = &settings.config;
    let source = AuditSource::parse(source);
    tracing::info!(
        "Auditing {} with {}",
        source.display(),
        settings
            .file
            .as_deref()
            .map_or_else(|| "default settings".to_owned(), |f| f.display().to_string())
    );
    let report = audit(&source, config);

    let output = match options.format {
        OutputFormat::Terminal => render::terminal(&report, &options.palette()),
        OutputFormat::Json => render::json(&report)?,
        OutputFormat::Markdown => render::markdown(&report),
    };
    println!("{output}");

    let code = report.exit_code(config.strict);
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_flag_selects_plain_palette() {
        let options = Options {
            no_color: true,
            ..Options::default()
        };
        assert_eq!(options.palette(), Palette::plain());
    }
}
