//! Declaration tree produced by the parser.
//!
//! Only the shapes an audit needs are modelled. Line numbers are 1-indexed.

/// A parsed Python module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    /// Top-level statements in source order.
    pub body: Vec<Stmt>,
}

/// A single statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = value` (possibly chained: `a = b = value`).
    Assign(Assign),
    /// `import a.b as c`
    Import(Import),
    /// `from .mod import a, b as c`
    ImportFrom(ImportFrom),
    /// `class Name(Base): ...`
    ClassDef(ClassDef),
    /// `def name(...): ...` or `async def`.
    FunctionDef(FunctionDef),
    /// `if`, `try`, `with`, `for`, `while` or `match` with its nested blocks flattened.
    Compound(Compound),
    /// Any statement the auditor does not inspect.
    Other {
        /// Line of the statement.
        line: usize,
    },
}

impl Stmt {
    /// Line on which the statement starts.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Assign(s) => s.line,
            Self::Import(s) => s.line,
            Self::ImportFrom(s) => s.line,
            Self::ClassDef(s) => s.line,
            Self::FunctionDef(s) => s.line,
            Self::Compound(s) => s.line,
            Self::Other { line } => *line,
        }
    }

    /// Nested statements, if this statement owns a body.
    #[must_use]
    pub fn children(&self) -> &[Stmt] {
        match self {
            Self::ClassDef(s) => &s.body,
            Self::FunctionDef(s) => &s.body,
            Self::Compound(s) => &s.body,
            _ => &[],
        }
    }
}

/// An assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    /// Line of the statement.
    pub line: usize,
    /// Simple or dotted targets, left to right.
    pub targets: Vec<String>,
    /// Assigned value.
    pub value: Expr,
}

impl Assign {
    /// Returns true if `name` is one of the targets.
    #[must_use]
    pub fn assigns(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t == name)
    }
}

/// A name in an import list, with its optional `as` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Imported (possibly dotted) name.
    pub name: String,
    /// Local alias.
    pub asname: Option<String>,
}

impl Alias {
    /// The name bound in the importing scope.
    #[must_use]
    pub fn bound_name(&self) -> &str {
        self.asname.as_deref().unwrap_or(&self.name)
    }
}

/// `import x, y as z`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Line of the statement.
    pub line: usize,
    /// Imported modules.
    pub names: Vec<Alias>,
}

/// `from x import y`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom {
    /// Line of the statement.
    pub line: usize,
    /// Module path after the leading dots, if any (`from . import x` has none).
    pub module: Option<String>,
    /// Number of leading dots.
    pub level: usize,
    /// Imported names.
    pub names: Vec<Alias>,
    /// `from x import *`
    pub wildcard: bool,
}

impl ImportFrom {
    /// Returns true if `name` appears in the import list.
    #[must_use]
    pub fn imports(&self, name: &str) -> bool {
        self.names.iter().any(|a| a.name == name)
    }

    /// Last segment of the module path (`pkg.version` gives `version`).
    #[must_use]
    pub fn module_leaf(&self) -> Option<&str> {
        self.module.as_deref().and_then(|m| m.rsplit('.').next())
    }
}

/// A class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Line of the `class` keyword (or first decorator).
    pub line: usize,
    /// Class name.
    pub name: String,
    /// Dotted names of positional base classes.
    pub bases: Vec<String>,
    /// Class body.
    pub body: Vec<Stmt>,
}

impl ClassDef {
    /// Last assignment to `name` directly in the class body.
    #[must_use]
    pub fn assignment(&self, name: &str) -> Option<&Assign> {
        self.body
            .iter()
            .rev()
            .find_map(|s| match s {
                Stmt::Assign(a) if a.assigns(name) => Some(a),
                _ => None,
            })
    }

    /// Method defined directly in the class body.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&FunctionDef> {
        self.body.iter().find_map(|s| match s {
            Stmt::FunctionDef(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    /// Returns true if any base's last segment equals `name`.
    #[must_use]
    pub fn inherits(&self, name: &str) -> bool {
        self.bases
            .iter()
            .any(|b| b.rsplit('.').next() == Some(name))
    }
}

/// A function or method definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Line of the `def` keyword (or first decorator).
    pub line: usize,
    /// Function name.
    pub name: String,
    /// `async def`
    pub is_async: bool,
    /// Function body.
    pub body: Vec<Stmt>,
}

impl FunctionDef {
    /// All statements in the body, depth-first.
    #[must_use]
    pub fn walk(&self) -> Vec<&Stmt> {
        let mut out = Vec::new();
        walk_into(&self.body, &mut out);
        out
    }
}

/// A compound statement whose blocks are flattened into one body.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    /// Line of the statement.
    pub line: usize,
    /// Tree-sitter node kind, e.g. `if_statement`.
    pub kind: String,
    /// Statements from every branch, in source order.
    pub body: Vec<Stmt>,
}

/// An expression, reduced to what can be known without evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String literal (adjacent literals concatenated).
    Str(String),
    /// Integer or float literal, as written.
    Number(String),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
    /// `[...]`
    List(Vec<Expr>),
    /// `(...)`
    Tuple(Vec<Expr>),
    /// `{a, b}`
    Set(Vec<Expr>),
    /// `{k: v}`
    Dict(Vec<(Expr, Expr)>),
    /// Bare identifier.
    Name(String),
    /// Dotted attribute path such as `os.environ`.
    Attribute(String),
    /// Call with a dotted callee and its positional arguments.
    Call {
        /// Dotted callee name.
        callee: String,
        /// Positional arguments.
        args: Vec<Expr>,
    },
    /// Present, but not statically known.
    Opaque,
}

impl Expr {
    /// String value, if this is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Dotted callee, if this is a call.
    #[must_use]
    pub fn callee(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }

    /// Returns true for values that cannot be known statically.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque)
    }
}

impl Module {
    /// Top-level assignments in source order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assign> {
        self.body.iter().filter_map(|s| match s {
            Stmt::Assign(a) => Some(a),
            _ => None,
        })
    }

    /// Last top-level assignment to `name`.
    #[must_use]
    pub fn assignment(&self, name: &str) -> Option<&Assign> {
        self.body.iter().rev().find_map(|s| match s {
            Stmt::Assign(a) if a.assigns(name) => Some(a),
            _ => None,
        })
    }

    /// String value of the last top-level assignment to `name`.
    ///
    /// Returns `None` when the final binding is not a string literal, even if an
    /// earlier assignment was.
    #[must_use]
    pub fn string_constant(&self, name: &str) -> Option<&str> {
        self.assignment(name).and_then(|a| a.value.as_str())
    }

    /// Top-level `from ... import ...` statements.
    pub fn imports_from(&self) -> impl Iterator<Item = &ImportFrom> {
        self.body.iter().filter_map(|s| match s {
            Stmt::ImportFrom(i) => Some(i),
            _ => None,
        })
    }

    /// Top-level class definitions.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.body.iter().filter_map(|s| match s {
            Stmt::ClassDef(c) => Some(c),
            _ => None,
        })
    }

    /// Top-level class named `name`.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes().find(|c| c.name == name)
    }

    /// Statements executed at import time: the top level plus the bodies of
    /// compound statements, but not class or function bodies.
    #[must_use]
    pub fn module_level(&self) -> Vec<&Stmt> {
        fn collect<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a Stmt>) {
            for stmt in stmts {
                out.push(stmt);
                if let Stmt::Compound(c) = stmt {
                    collect(&c.body, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.body, &mut out);
        out
    }

    /// Every statement in the module, depth-first.
    #[must_use]
    pub fn walk(&self) -> Vec<&Stmt> {
        let mut out = Vec::new();
        walk_into(&self.body, &mut out);
        out
    }
}

fn walk_into<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a Stmt>) {
    for stmt in stmts {
        out.push(stmt);
        walk_into(stmt.children(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(line: usize, name: &str, value: Expr) -> Stmt {
        Stmt::Assign(Assign {
            line,
            targets: vec![name.to_owned()],
            value,
        })
    }

    #[test]
    fn last_assignment_wins() {
        let module = Module {
            body: vec![
                assign(1, "__version__", Expr::Str("0.1.0".into())),
                assign(2, "__version__", Expr::Str("0.2.0".into())),
            ],
        };
        assert_eq!(module.string_constant("__version__"), Some("0.2.0"));
    }

    #[test]
    fn non_literal_rebinding_hides_constant() {
        let module = Module {
            body: vec![
                assign(1, "__version__", Expr::Str("0.1.0".into())),
                assign(2, "__version__", Expr::Opaque),
            ],
        };
        assert_eq!(module.string_constant("__version__"), None);
    }

    #[test]
    fn module_level_skips_function_bodies() {
        let module = Module {
            body: vec![
                Stmt::Compound(Compound {
                    line: 1,
                    kind: "if_statement".into(),
                    body: vec![assign(2, "a", Expr::None)],
                }),
                Stmt::FunctionDef(FunctionDef {
                    line: 3,
                    name: "f".into(),
                    is_async: false,
                    body: vec![assign(4, "b", Expr::None)],
                }),
            ],
        };
        let lines: Vec<usize> = module.module_level().iter().map(|s| s.line()).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(module.walk().len(), 4);
    }

    #[test]
    fn inherits_matches_last_segment() {
        let class = ClassDef {
            line: 1,
            name: "Cfg".into(),
            bases: vec!["netbox.plugins.PluginConfig".into()],
            body: Vec::new(),
        };
        assert!(class.inherits("PluginConfig"));
        assert!(!class.inherits("AppConfig"));
    }

    #[test]
    fn alias_bound_name() {
        let plain = Alias { name: "x".into(), asname: None };
        let renamed = Alias { name: "x".into(), asname: Some("y".into()) };
        assert_eq!(plain.bound_name(), "x");
        assert_eq!(renamed.bound_name(), "y");
    }
}
