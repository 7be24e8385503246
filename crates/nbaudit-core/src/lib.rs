//! # nbaudit-core
//!
//! Core framework for auditing NetBox plugin source trees.
//!
//! This crate provides the foundational traits and types for running plugin
//! audits. It includes:
//!
//! - [`Check`] trait for diagnostic procedures that each produce one category
//! - [`CheckRunner`] for executing a catalogue of checks with failure isolation
//! - [`AuditReport`] and [`Summary`] for aggregating and scoring results
//! - [`metadata`] for package discovery and version resolution
//!
//! ## Example
//!
//! ```ignore
//! use nbaudit_core::{CheckRunner, Config};
//!
//! let runner = CheckRunner::builder()
//!     .root("./netbox-demo")
//!     .config(Config::default())
//!     .check(MyCheck)
//!     .build()?;
//!
//! let categories = runner.run();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod check;
mod config;
mod context;
mod report;
mod runner;
mod types;

pub mod metadata;
pub mod process;

pub use check::{Check, CheckBox, CheckError, CheckGroup};
pub use config::{CheckConfig, Config, ConfigError, RunnerConfig, Timeouts, ToolsConfig};
pub use context::AuditContext;
pub use report::{AuditReport, ScoreBand, Summary};
pub use runner::{CheckRunner, CheckRunnerBuilder, RunnerError};
pub use types::{CategoryResult, CheckResult, Severity};
