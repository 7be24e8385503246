//! # nbaudit
//!
//! Audits NetBox plugin repositories for structure, metadata, and best
//! practices.
//!
//! This is the facade crate: it re-exports the core data model and the
//! built-in checks, and adds source acquisition plus the end-to-end
//! [`audit`] operation.
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use nbaudit::{audit, AuditSource, Config};
//!
//! let report = audit(&AuditSource::parse("./netbox-demo"), &Config::default());
//! println!("{}/{} checks passed", report.summary.passed, report.summary.total);
//! std::process::exit(report.exit_code(false));
//! ```

#![forbid(unsafe_code)]

pub use nbaudit_core::*;

/// Built-in checks and the catalogue.
pub mod checks {
    pub use nbaudit_checks::*;
}

mod auditor;
mod source;

pub use auditor::{audit, audit_with};
pub use source::{AcquireError, AuditSource, Workspace};
