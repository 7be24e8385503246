//! # nbaudit-python
//!
//! Tree-sitter based parser for the subset of Python that plugin audits care
//! about.
//!
//! The parser turns module source text into a small declaration tree:
//!
//! - [`Assign`] statements with simple name targets and a literal-or-opaque value
//! - [`Import`] and [`ImportFrom`] statements
//! - [`ClassDef`] bodies with their base-class names
//! - [`FunctionDef`] bodies (so hook methods can be inspected)
//!
//! Anything that is not a string, number, boolean, `None` or collection
//! literal is kept structurally ([`Expr::Name`], [`Expr::Attribute`],
//! [`Expr::Call`]) or becomes [`Expr::Opaque`]. Nothing is evaluated.
//!
//! ## Example
//!
//! ```ignore
//! use nbaudit_python::parse_module;
//!
//! let module = parse_module("__version__ = \"1.2.3\"\n")?;
//! assert_eq!(module.string_constant("__version__"), Some("1.2.3"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ast;
mod error;
mod parser;

pub use ast::{
    Alias, Assign, ClassDef, Compound, Expr, FunctionDef, Import, ImportFrom, Module, Stmt,
};
pub use error::ParseError;
pub use parser::{parse_module, PythonParser};
