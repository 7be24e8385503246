//! netbox-plugin-audit CLI tool.
//!
//! Usage:
//! ```bash
//! netbox-plugin-audit audit [OPTIONS] <SOURCE>
//! netbox-plugin-audit list-checks
//! netbox-plugin-audit init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;
mod settings;

/// Audit NetBox plugins for structure, metadata, and best practices
#[derive(Parser)]
#[command(name = "netbox-plugin-audit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NBAUDIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a plugin from a local path or git URL
    Audit {
        /// Git URL or local path to the plugin
        source: String,

        /// Output format
        #[arg(short, long, default_value = "terminal")]
        format: OutputFormat,

        /// Exit with code 1 on any warning or error
        #[arg(long)]
        strict: bool,

        /// Skip ruff/black/isort/flake8 checks
        #[arg(long)]
        skip_lint: bool,

        /// Skip package build test
        #[arg(long)]
        skip_build: bool,

        /// Skip GitHub and PyPI lookups
        #[arg(long)]
        offline: bool,

        /// Disable colors and icons in terminal output
        #[arg(long)]
        no_color: bool,
    },

    /// List available checks
    ListChecks,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for audit reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored human-readable report.
    #[default]
    Terminal,
    /// JSON document.
    Json,
    /// Markdown document.
    Markdown,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Audit {
            source,
            format,
            strict,
            skip_lint,
            skip_build,
            offline,
            no_color,
        } => {
            let switches = settings::Switches {
                strict,
                skip_lint,
                skip_build,
                offline,
            };
            let settings =
                settings::load(&std::env::current_dir()?, cli.config.as_deref(), switches)?;
            let options = commands::audit::Options { format, no_color };
            commands::audit::run(&source, &options, &settings)
        }
        Commands::ListChecks => {
            commands::list_checks::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
