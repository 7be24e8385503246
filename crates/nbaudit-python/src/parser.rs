//! Python source parser using Tree-sitter.

use tree_sitter::{Language, Node, Parser};

use crate::ast::{
    Alias, Assign, ClassDef, Compound, Expr, FunctionDef, Import, ImportFrom, Module, Stmt,
};
use crate::error::ParseError;

/// Parses Python source into a [`Module`].
pub struct PythonParser {
    language: Language,
}

impl PythonParser {
    /// Creates a new Python parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Parses `source`, failing at the first syntax error.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the source contains an `ERROR` or `MISSING`
    /// node, or if the grammar cannot be loaded.
    pub fn parse(&self, source: &str) -> Result<Module, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::no_tree(format!("failed to load python grammar: {e}")))?;

        let src = source.as_bytes();
        let tree = parser
            .parse(src, None)
            .ok_or_else(|| ParseError::no_tree("parser produced no syntax tree"))?;
        let root = tree.root_node();

        if root.has_error() {
            if let Some(bad) = first_error(root) {
                return Err(error_at(&bad));
            }
            return Err(ParseError::no_tree("invalid syntax"));
        }
        check_nesting(root)?;

        Ok(Module {
            body: convert_block(&root, src),
        })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses `source` with a fresh [`PythonParser`].
///
/// # Errors
///
/// See [`PythonParser::parse`].
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    PythonParser::new().parse(source)
}

fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

fn line_of(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Pre-order search for the first `ERROR` or `MISSING` node.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Bracket nesting accepted before the source is rejected.
const MAX_BRACKET_DEPTH: usize = 200;
/// Indented block nesting accepted before the source is rejected.
const MAX_BLOCK_DEPTH: usize = 100;

#[derive(Clone, Copy)]
enum Nesting {
    Bracket,
    Block,
    Flat,
}

fn nesting(kind: &str) -> Nesting {
    match kind {
        "parenthesized_expression" | "list" | "tuple" | "set" | "dictionary" | "argument_list"
        | "subscript" | "list_comprehension" | "set_comprehension"
        | "dictionary_comprehension" | "generator_expression" => Nesting::Bracket,
        "block" => Nesting::Block,
        _ => Nesting::Flat,
    }
}

/// Rejects trees nested deeper than the converter is willing to recurse.
///
/// The walk itself runs on a [`tree_sitter::TreeCursor`], so arbitrarily deep
/// input is measured without growing the call stack.
fn check_nesting(root: Node<'_>) -> Result<(), ParseError> {
    let mut cursor = root.walk();
    let mut brackets = 0usize;
    let mut blocks = 0usize;
    loop {
        let node = cursor.node();
        match nesting(node.kind()) {
            Nesting::Bracket => {
                brackets += 1;
                if brackets > MAX_BRACKET_DEPTH {
                    return Err(error_with(&node, "too many nested parentheses"));
                }
            }
            Nesting::Block => {
                blocks += 1;
                if blocks > MAX_BLOCK_DEPTH {
                    return Err(error_with(&node, "too many levels of indentation"));
                }
            }
            Nesting::Flat => {}
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            match nesting(cursor.node().kind()) {
                Nesting::Bracket => brackets -= 1,
                Nesting::Block => blocks -= 1,
                Nesting::Flat => {}
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}

fn error_at(node: &Node<'_>) -> ParseError {
    if node.is_missing() {
        error_with(node, format!("missing `{}`", node.kind()))
    } else {
        error_with(node, "invalid syntax")
    }
}

fn error_with(node: &Node<'_>, message: impl Into<String>) -> ParseError {
    let pos = node.start_position();
    ParseError::new(
        message,
        pos.row + 1,
        pos.column + 1,
        node.start_byte(),
        node.end_byte().saturating_sub(node.start_byte()),
    )
}

/// Converts the statements directly inside `node` (a `module` or `block`).
fn convert_block(node: &Node<'_>, src: &[u8]) -> Vec<Stmt> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        if child.kind().ends_with("_clause") {
            // case_clause sits directly in a match block
            out.extend(collect_branches(&child, src));
            continue;
        }
        out.push(convert_stmt(&child, src));
    }
    out
}

fn convert_stmt(node: &Node<'_>, src: &[u8]) -> Stmt {
    let line = line_of(node);
    match node.kind() {
        "expression_statement" => convert_expression_statement(node, src),
        "import_statement" => Stmt::Import(Import {
            line,
            names: aliases(node, src),
        }),
        "import_from_statement" => convert_import_from(node, src),
        "class_definition" => convert_class(node, src, line),
        "function_definition" => convert_function(node, src, line),
        "decorated_definition" => match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "class_definition" => convert_class(&def, src, line),
            Some(def) if def.kind() == "function_definition" => {
                convert_function(&def, src, line)
            }
            _ => Stmt::Other { line },
        },
        "if_statement" | "for_statement" | "while_statement" | "try_statement"
        | "with_statement" | "match_statement" => Stmt::Compound(Compound {
            line,
            kind: node.kind().to_owned(),
            body: collect_branches(node, src),
        }),
        _ => Stmt::Other { line },
    }
}

/// Flattens every block under a compound statement, following `*_clause` nodes.
fn collect_branches(node: &Node<'_>, src: &[u8]) -> Vec<Stmt> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "block" {
            out.extend(convert_block(&child, src));
        } else if child.kind().ends_with("_clause") {
            out.extend(collect_branches(&child, src));
        }
    }
    out
}

fn convert_expression_statement(node: &Node<'_>, src: &[u8]) -> Stmt {
    let line = line_of(node);
    let Some(inner) = node.named_child(0) else {
        return Stmt::Other { line };
    };
    if inner.kind() != "assignment" {
        return Stmt::Other { line };
    }

    let mut targets = Vec::new();
    let mut current = inner;
    loop {
        if let Some(target) = current.child_by_field_name("left").and_then(|l| dotted(&l, src)) {
            targets.push(target);
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            Some(right) => {
                if targets.is_empty() {
                    return Stmt::Other { line };
                }
                return Stmt::Assign(Assign {
                    line,
                    targets,
                    value: convert_expr(&right, src),
                });
            }
            // annotation only: `x: int`
            None => return Stmt::Other { line },
        }
    }
}

fn convert_import_from(node: &Node<'_>, src: &[u8]) -> Stmt {
    let mut module = None;
    let mut level = 0;

    if let Some(module_node) = node.child_by_field_name("module_name") {
        if module_node.kind() == "relative_import" {
            let mut cursor = module_node.walk();
            for child in module_node.named_children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => level = text(&child, src).matches('.').count(),
                    "dotted_name" => module = Some(compact(text(&child, src))),
                    _ => {}
                }
            }
        } else {
            module = Some(compact(text(&module_node, src)));
        }
    }

    let mut wildcard = false;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            wildcard = true;
        }
    }

    Stmt::ImportFrom(ImportFrom {
        line: line_of(node),
        module,
        level,
        names: aliases(node, src),
        wildcard,
    })
}

/// Reads the `name` fields of an import statement.
fn aliases(node: &Node<'_>, src: &[u8]) -> Vec<Alias> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        if child.kind() == "aliased_import" {
            let name = child
                .child_by_field_name("name")
                .map(|n| compact(text(&n, src)))
                .unwrap_or_default();
            let asname = child
                .child_by_field_name("alias")
                .map(|n| text(&n, src).to_owned());
            out.push(Alias { name, asname });
        } else {
            out.push(Alias {
                name: compact(text(&child, src)),
                asname: None,
            });
        }
    }
    out
}

fn convert_class(node: &Node<'_>, src: &[u8], line: usize) -> Stmt {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_owned())
        .unwrap_or_default();

    let mut bases = Vec::new();
    if let Some(args) = node.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if let Some(base) = dotted(&arg, src) {
                bases.push(base);
            }
        }
    }

    let body = node
        .child_by_field_name("body")
        .map(|b| convert_block(&b, src))
        .unwrap_or_default();

    Stmt::ClassDef(ClassDef {
        line,
        name,
        bases,
        body,
    })
}

fn convert_function(node: &Node<'_>, src: &[u8], line: usize) -> Stmt {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(&n, src).to_owned())
        .unwrap_or_default();
    let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
    let body = node
        .child_by_field_name("body")
        .map(|b| convert_block(&b, src))
        .unwrap_or_default();

    Stmt::FunctionDef(FunctionDef {
        line,
        name,
        is_async,
        body,
    })
}

/// Dotted path for `identifier` and `attribute` chains.
fn dotted(node: &Node<'_>, src: &[u8]) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = *node;
    while current.kind() == "attribute" {
        segments.push(text(&current.child_by_field_name("attribute")?, src));
        current = current.child_by_field_name("object")?;
    }
    if current.kind() != "identifier" {
        return None;
    }
    segments.push(text(&current, src));
    segments.reverse();
    Some(segments.join("."))
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn convert_expr(node: &Node<'_>, src: &[u8]) -> Expr {
    match node.kind() {
        "string" => parse_string_literal(text(node, src)).map_or(Expr::Opaque, Expr::Str),
        "concatenated_string" => {
            let mut joined = String::new();
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                if part.kind() == "comment" {
                    continue;
                }
                match parse_string_literal(text(&part, src)) {
                    Some(s) => joined.push_str(&s),
                    None => return Expr::Opaque,
                }
            }
            Expr::Str(joined)
        }
        "integer" | "float" => Expr::Number(text(node, src).to_owned()),
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        "none" => Expr::None,
        "list" => Expr::List(convert_items(node, src)),
        "tuple" => Expr::Tuple(convert_items(node, src)),
        "set" => Expr::Set(convert_items(node, src)),
        "dictionary" => {
            let mut pairs = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "pair" {
                    continue;
                }
                if let (Some(k), Some(v)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) {
                    pairs.push((convert_expr(&k, src), convert_expr(&v, src)));
                }
            }
            Expr::Dict(pairs)
        }
        "parenthesized_expression" => node
            .named_child(0)
            .map_or(Expr::Opaque, |inner| convert_expr(&inner, src)),
        "identifier" => Expr::Name(text(node, src).to_owned()),
        "attribute" => dotted(node, src).map_or(Expr::Opaque, Expr::Attribute),
        "call" => {
            let Some(callee) = node
                .child_by_field_name("function")
                .and_then(|f| dotted(&f, src))
            else {
                return Expr::Opaque;
            };
            let mut args = Vec::new();
            if let Some(arg_list) = node.child_by_field_name("arguments") {
                let mut cursor = arg_list.walk();
                for arg in arg_list.named_children(&mut cursor) {
                    if matches!(
                        arg.kind(),
                        "keyword_argument" | "comment" | "list_splat" | "dictionary_splat"
                    ) {
                        continue;
                    }
                    args.push(convert_expr(&arg, src));
                }
            }
            Expr::Call { callee, args }
        }
        _ => Expr::Opaque,
    }
}

fn convert_items(node: &Node<'_>, src: &[u8]) -> Vec<Expr> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .map(|c| convert_expr(&c, src))
        .collect()
}

/// Decodes a single string literal token, prefix and quotes included.
///
/// f-strings and byte strings are not static text and yield `None`.
fn parse_string_literal(raw: &str) -> Option<String> {
    let quote_at = raw.find(['"', '\''])?;
    let prefix = raw[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }
    let is_raw = prefix.contains('r');
    let rest = &raw[quote_at..];

    let inner = if rest.len() >= 6 && (rest.starts_with("\"\"\"") || rest.starts_with("'''")) {
        rest.get(3..rest.len() - 3)?
    } else if rest.len() >= 2 {
        rest.get(1..rest.len() - 1)?
    } else {
        return None;
    };

    if is_raw {
        Some(inner.to_owned())
    } else {
        unescape(inner)
    }
}

/// Decodes backslash escapes. `\N{...}` needs the Unicode name table and
/// yields `None`, as does an escape naming an invalid code point.
fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '\\' | '\'' | '"' => out.push(esc),
            '\n' => {}
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            'N' => return None,
            '0'..='7' => {
                let mut code = esc.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code)?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Module {
        parse_module(src).unwrap()
    }

    #[test]
    fn reads_top_level_version() {
        let m = parse("__version__ = \"1.2.3\"\n");
        assert_eq!(m.string_constant("__version__"), Some("1.2.3"));
    }

    #[test]
    fn single_quotes_and_escapes() {
        let m = parse("a = 'it\\'s'\nb = r'\\d+'\n");
        assert_eq!(m.string_constant("a"), Some("it's"));
        assert_eq!(m.string_constant("b"), Some("\\d+"));
    }

    #[test]
    fn triple_quoted_string() {
        let m = parse("doc = \"\"\"hello\nworld\"\"\"\n");
        assert_eq!(m.string_constant("doc"), Some("hello\nworld"));
    }

    #[test]
    fn concatenated_strings_join() {
        let m = parse("x = (\"a\" \"b\")\n");
        assert_eq!(m.string_constant("x"), Some("ab"));
    }

    #[test]
    fn f_string_is_opaque() {
        let m = parse("v = f\"{major}.0\"\n");
        assert!(m.assignment("v").unwrap().value.is_opaque());
    }

    #[test]
    fn chained_assignment_collects_targets() {
        let m = parse("a = b = \"x\"\n");
        let assign = m.assignments().next().unwrap();
        assert_eq!(assign.targets, vec!["a", "b"]);
    }

    #[test]
    fn annotated_assignment_keeps_value() {
        let m = parse("name: str = \"demo\"\nother: int\n");
        assert_eq!(m.string_constant("name"), Some("demo"));
        assert!(m.assignment("other").is_none());
    }

    #[test]
    fn relative_import_level() {
        let m = parse("from .version import __version__\nfrom .. import x\n");
        let imports: Vec<&ImportFrom> = m.imports_from().collect();
        assert_eq!(imports[0].level, 1);
        assert_eq!(imports[0].module.as_deref(), Some("version"));
        assert!(imports[0].imports("__version__"));
        assert_eq!(imports[1].level, 2);
        assert_eq!(imports[1].module, None);
    }

    #[test]
    fn absolute_import_with_alias() {
        let m = parse("from netbox_demo._version import __version__ as v\n");
        let imp = m.imports_from().next().unwrap();
        assert_eq!(imp.level, 0);
        assert_eq!(imp.module_leaf(), Some("_version"));
        assert_eq!(imp.names[0].bound_name(), "v");
    }

    #[test]
    fn wildcard_import() {
        let m = parse("from .models import *\n");
        assert!(m.imports_from().next().unwrap().wildcard);
    }

    #[test]
    fn class_bases_and_body() {
        let m = parse(
            "from netbox.plugins import PluginConfig\n\n\
             class DemoConfig(PluginConfig, metaclass=Meta):\n    \
             name = \"netbox_demo\"\n    min_version = \"4.0.0\"\n\n\
             config = DemoConfig\n",
        );
        let class = m.class("DemoConfig").unwrap();
        assert_eq!(class.bases, vec!["PluginConfig"]);
        assert_eq!(
            class.assignment("name").and_then(|a| a.value.as_str()),
            Some("netbox_demo")
        );
        assert_eq!(
            m.assignment("config").map(|a| &a.value),
            Some(&Expr::Name("DemoConfig".into()))
        );
    }

    #[test]
    fn dotted_base_class() {
        let m = parse("class C(plugins.PluginConfig):\n    pass\n");
        assert!(m.class("C").unwrap().inherits("PluginConfig"));
    }

    #[test]
    fn method_body_imports() {
        let m = parse(
            "class C:\n    def ready(self):\n        super().ready()\n        from . import widgets\n",
        );
        let ready = m.class("C").unwrap().method("ready").unwrap();
        assert!(!ready.is_async);
        assert!(ready.walk().iter().any(|s| matches!(
            s,
            Stmt::ImportFrom(i) if i.imports("widgets")
        )));
    }

    #[test]
    fn async_function() {
        let m = parse("async def fetch():\n    return 1\n");
        match &m.body[0] {
            Stmt::FunctionDef(f) => assert!(f.is_async),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decorated_class() {
        let m = parse("@register\nclass Widget(DashboardWidget):\n    pass\n");
        assert!(m.class("Widget").is_some());
    }

    #[test]
    fn compound_statements_are_module_level_only() {
        let m = parse(
            "try:\n    from importlib.metadata import version\nexcept ImportError:\n    version = None\n",
        );
        assert!(m.imports_from().next().is_none());
        assert!(m
            .module_level()
            .iter()
            .any(|s| matches!(s, Stmt::ImportFrom(i) if i.imports("version"))));
    }

    #[test]
    fn call_callee_is_dotted() {
        let m = parse("__version__ = importlib.metadata.version(\"netbox-demo\")\n");
        let value = &m.assignment("__version__").unwrap().value;
        assert_eq!(value.callee(), Some("importlib.metadata.version"));
    }

    #[test]
    fn collection_literals() {
        let m = parse("d = {\"a\": [1, 2.5], \"b\": (True, None)}\n");
        let Expr::Dict(pairs) = &m.assignment("d").unwrap().value else {
            panic!("expected dict");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs[0].1,
            Expr::List(vec![Expr::Number("1".into()), Expr::Number("2.5".into())])
        );
        assert_eq!(pairs[1].1, Expr::Tuple(vec![Expr::Bool(true), Expr::None]));
    }

    #[test]
    fn syntax_error_has_location() {
        let err = parse_module("def broken(:\n    pass\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column >= 1);
    }

    #[test]
    fn empty_source() {
        assert!(parse("").body.is_empty());
    }

    #[test]
    fn numeric_escapes_decode() {
        let m = parse("v = \"\\x31.\\u0032.\\U00000033\"\nw = \"a\\101\\0\"\n");
        assert_eq!(m.string_constant("v"), Some("1.2.3"));
        assert_eq!(m.string_constant("w"), Some("aA\0"));
    }

    #[test]
    fn named_escape_is_opaque() {
        let m = parse("v = \"\\N{DIGIT ONE}.0\"\nw = \"\\ud800\"\n");
        assert!(m.assignment("v").unwrap().value.is_opaque());
        assert!(m.assignment("w").unwrap().value.is_opaque());
    }

    #[test]
    fn deep_brackets_are_rejected() {
        let src = format!("x = {}{}\n", "[".repeat(100_000), "]".repeat(100_000));
        let err = parse_module(&src).unwrap_err();
        assert_eq!(err.message, "too many nested parentheses");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn nesting_at_the_limit_converts() {
        let depth = MAX_BRACKET_DEPTH;
        let src = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(
            parse(&src).assignment("x").map(|a| &a.value),
            Some(&Expr::Number("1".into()))
        );
    }

    #[test]
    fn deep_blocks_are_rejected() {
        let mut src = String::new();
        for level in 0..=MAX_BLOCK_DEPTH {
            src.push_str(&"    ".repeat(level));
            src.push_str("if x:\n");
        }
        src.push_str(&"    ".repeat(MAX_BLOCK_DEPTH + 1));
        src.push_str("pass\n");
        let err = parse_module(&src).unwrap_err();
        assert_eq!(err.message, "too many levels of indentation");
    }

    #[test]
    fn long_attribute_chain() {
        let chain = vec!["a"; 5_000].join(".");
        let m = parse(&format!("x = {chain}\n"));
        assert!(matches!(
            &m.assignment("x").unwrap().value,
            Expr::Attribute(path) if path.len() == chain.len()
        ));
    }

    #[test]
    fn comments_are_skipped() {
        let m = parse("# header\nx = 1  # trailing\n");
        assert_eq!(m.body.len(), 1);
    }
}
