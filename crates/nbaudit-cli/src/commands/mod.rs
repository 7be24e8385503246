//! CLI subcommand implementations.

pub mod audit;
pub mod init;
pub mod list_checks;
