//! # nbaudit-checks
//!
//! Built-in audit checks for netbox-plugin-audit.
//!
//! ## Available Checks
//!
//! | Tag | Name | Group | Description |
//! |-----|------|-------|-------------|
//! | F | `structure` | core | Required and recommended repository files |
//! | C | `plugin-config` | core | `PluginConfig` subclass in `__init__.py` |
//! | P | `pyproject` | core | `pyproject.toml` metadata and tool config |
//! | V | `versioning` | core | Version agreement across sources |
//! | L | `changelog` | core | Keep a Changelog conventions |
//! | R | `readme` | core | README sections, badges, screenshots |
//! | D | `django-app` | core | Django app layout |
//! | W | `workflows` | core | GitHub Actions CI and release |
//! | S | `security` | core | Secrets, TLS verification, timeouts |
//! | T | `certification` | core | Plugin Certification Program |
//! | G | `github` | network | GitHub repository health |
//! | Q | `linting` | lint | ruff, black, isort, flake8 |
//! | B | `packaging` | build | Build, twine and PyPI |
//!
//! ## Usage
//!
//! ```ignore
//! use nbaudit_checks::default_catalog;
//! use nbaudit_core::{CheckRunner, Config};
//!
//! let config = Config::default();
//! let runner = CheckRunner::builder()
//!     .root("./netbox-demo")
//!     .checks(default_catalog(&config))
//!     .config(config)
//!     .build()?;
//! let categories = runner.run();
//! ```

mod catalog;
mod certification;
mod changelog;
mod django_app;
mod github;
pub mod http;
mod linting;
mod packaging;
mod plugin_config;
mod pyproject;
mod readme;
mod security;
mod structure;
mod util;
mod versioning;
mod workflows;

pub use catalog::{catalog_with_client, core_checks, default_catalog};
pub use certification::Certification;
pub use changelog::Changelog;
pub use django_app::DjangoApp;
pub use github::GitHub;
pub use http::{HttpClient, HttpError, ReqwestClient};
pub use linting::Linting;
pub use packaging::Packaging;
pub use plugin_config::PluginConfig;
pub use pyproject::Pyproject;
pub use readme::Readme;
pub use security::Security;
pub use structure::Structure;
pub use versioning::Versioning;
pub use workflows::Workflows;

/// Re-export core types for convenience.
pub use nbaudit_core::{CategoryResult, Check, CheckBox, Severity};
