//! Check the `PluginConfig` subclass declared in the package entry point.

use std::sync::LazyLock;

use nbaudit_core::metadata::ENTRY_POINT;
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use nbaudit_python::{parse_module, ClassDef, Expr, Module, Stmt};
use regex::Regex;
use tracing::debug;

use crate::util::{last_segment, read, regex, truncate};

/// Check name for plugin-config.
pub const NAME: &str = "plugin-config";

const REQUIRED_ATTRS: &[&str] = &[
    "name",
    "verbose_name",
    "description",
    "version",
    "base_url",
    "min_version",
];
const AUTHOR_ATTRS: &[&str] = &["author", "author_email"];
const DISPLAY_LIMIT: usize = 60;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| regex(r"^[^@]+@[^@]+\.[^@]+$"));
static URL_SAFE: LazyLock<Regex> = LazyLock::new(|| regex(r"^[a-z0-9-]+$"));

/// What a class attribute was bound to, as far as it can be known.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrValue {
    Literal(String),
    Reference(String),
    DynamicVersion,
    Present,
}

impl AttrValue {
    fn literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Result message for a set attribute.
    fn describe(&self, attr: &str) -> String {
        match self {
            Self::Literal(s) => format!("{attr} = \"{}\"", truncate(s, DISPLAY_LIMIT)),
            Self::Reference(target) => format!("{attr} set (references {target})"),
            Self::DynamicVersion => format!("{attr} set (via importlib.metadata)"),
            Self::Present => format!("{attr} set"),
        }
    }
}

/// Validates the plugin's `PluginConfig` declaration.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig;

impl PluginConfig {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for PluginConfig {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "PluginConfig"
    }

    fn tag(&self) -> &'static str {
        "C"
    }

    fn description(&self) -> &'static str {
        "PluginConfig subclass, config assignment, attributes, ready() and __version__"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let (Some(pkg), Some(pkg_name)) = (ctx.package_dir.as_deref(), ctx.package_name()) else {
            cat.error("package", "No package directory to check");
            return Ok(cat);
        };

        let init = pkg.join(ENTRY_POINT);
        if !init.is_file() {
            cat.error("init_py", "__init__.py not found");
            return Ok(cat);
        }
        let module = match parse_module(&read(&init)?) {
            Ok(m) => m,
            Err(e) => {
                cat.error("parse", format!("Syntax error in __init__.py: {e}"));
                return Ok(cat);
            }
        };

        let Some(class) = module.classes().find(|c| c.inherits("PluginConfig")) else {
            cat.error("pluginconfig_class", "No PluginConfig subclass found");
            return Ok(cat);
        };
        cat.pass(
            "pluginconfig_class",
            format!("PluginConfig subclass: {}", class.name),
        );

        let config_target = module.assignment("config").and_then(|a| match &a.value {
            Expr::Name(n) => Some(n.as_str()),
            _ => None,
        });
        match config_target {
            Some(target) if target == class.name => {
                cat.pass("config_assignment", format!("config = {target}"));
            }
            Some(target) => cat.warn(
                "config_assignment",
                format!("config = {target} (expected {})", class.name),
            ),
            None => cat.error(
                "config_assignment",
                "No `config = ClassName` assignment found",
            ),
        }

        let attr = |name: &str| class_attr(&module, class, name);

        for name in REQUIRED_ATTRS {
            match attr(name) {
                Some(value) => cat.pass(*name, value.describe(name)),
                None => cat.error(*name, format!("{name} not set")),
            }
        }
        for name in AUTHOR_ATTRS {
            match attr(name) {
                Some(value) => cat.pass(*name, value.describe(name)),
                None => cat.warn(*name, format!("{name} not set in PluginConfig")),
            }
        }
        match attr("max_version") {
            Some(value) => cat.pass("max_version", value.describe("max_version")),
            None => cat.warn("max_version", "max_version not set"),
        }
        if attr("default_settings").is_some() {
            cat.pass("default_settings", "default_settings defined");
        } else {
            cat.info("default_settings", "default_settings not defined");
        }

        validate_literals(&mut cat, pkg_name, &attr);

        if let Some(imports_widgets) = ready_imports_widgets(ctx, class) {
            if imports_widgets {
                cat.pass("ready_widgets", "ready() imports widgets module");
            } else {
                cat.warn(
                    "ready_widgets",
                    "widgets.py has widget classes but ready() doesn't import widgets (widgets won't register)",
                );
            }
        }

        check_module_version(&mut cat, &module, attr("version").as_ref());

        Ok(cat)
    }
}

fn class_attr(module: &Module, class: &ClassDef, name: &str) -> Option<AttrValue> {
    let value = &class.assignment(name)?.value;
    Some(match value {
        Expr::Str(s) => AttrValue::Literal(s.clone()),
        Expr::Name(n) | Expr::Attribute(n) => AttrValue::Reference(n.clone()),
        call if is_metadata_version_call(module, call) => AttrValue::DynamicVersion,
        _ => AttrValue::Present,
    })
}

/// `importlib.metadata.version(..)`, `metadata.version(..)` or a bare
/// `version(..)` imported from `importlib.metadata`.
fn is_metadata_version_call(module: &Module, expr: &Expr) -> bool {
    let Some(callee) = expr.callee() else {
        return false;
    };
    if callee.ends_with("metadata.version") {
        return true;
    }
    module.imports_from().any(|i| {
        matches!(
            i.module.as_deref(),
            Some("importlib.metadata" | "importlib_metadata")
        ) && i
            .names
            .iter()
            .any(|a| a.name == "version" && a.bound_name() == callee)
    })
}

fn validate_literals(
    cat: &mut CategoryResult,
    pkg_name: &str,
    attr: &dyn Fn(&str) -> Option<AttrValue>,
) {
    if let Some(name) = attr("name").as_ref().and_then(AttrValue::literal) {
        if name == pkg_name {
            cat.pass("name_match", "name matches package directory");
        } else {
            cat.warn(
                "name_match",
                format!("name \"{name}\" != directory \"{pkg_name}\""),
            );
        }
    }

    if let Some(email) = attr("author_email").as_ref().and_then(AttrValue::literal) {
        if EMAIL.is_match(email) {
            cat.pass("email_format", format!("Valid email: {email}"));
        } else {
            cat.warn("email_format", format!("Invalid email format: {email}"));
        }
    }

    if let Some(base_url) = attr("base_url").as_ref().and_then(AttrValue::literal) {
        if URL_SAFE.is_match(base_url) {
            cat.pass("base_url_format", format!("URL-safe base_url: {base_url}"));
        } else {
            cat.warn(
                "base_url_format",
                format!("base_url may not be URL-safe: {base_url}"),
            );
        }
    }

    if let Some(min) = attr("min_version").as_ref().and_then(AttrValue::literal) {
        let major = min.split('.').next().and_then(|m| m.trim().parse::<u32>().ok());
        match major {
            Some(m) if m >= 4 => {
                cat.pass("min_version_value", format!("min_version {min} >= 4.0.0"));
            }
            Some(_) => cat.warn(
                "min_version_value",
                format!("min_version {min} < 4.0.0 (consider 4.0.0+)"),
            ),
            None => {}
        }
    }
}

/// `None` when `widgets.py` defines no widget classes; otherwise whether
/// `ready()` imports the widgets module.
fn ready_imports_widgets(ctx: &AuditContext, class: &ClassDef) -> Option<bool> {
    let source = std::fs::read_to_string(ctx.package_path("widgets.py")?).ok()?;
    let widgets = match parse_module(&source) {
        Ok(m) => m,
        Err(e) => {
            debug!("Cannot parse widgets.py: {}", e);
            return None;
        }
    };
    let has_widgets = widgets
        .classes()
        .any(|c| c.bases.iter().any(|b| last_segment(b).contains("Widget")));
    if !has_widgets {
        return None;
    }

    let Some(ready) = class.method("ready") else {
        return Some(false);
    };
    Some(ready.walk().into_iter().any(|stmt| match stmt {
        Stmt::ImportFrom(i) => match i.module.as_deref() {
            Some(m) => m.contains("widgets"),
            None => i.imports("widgets"),
        },
        Stmt::Import(i) => i.names.iter().any(|a| a.name.contains("widgets")),
        _ => false,
    }))
}

fn check_module_version(cat: &mut CategoryResult, module: &Module, class_version: Option<&AttrValue>) {
    let statements = module.module_level();
    let constant = statements.iter().rev().find_map(|s| match s {
        Stmt::Assign(a) if a.assigns("__version__") => Some(&a.value),
        _ => None,
    });

    if let Some(Expr::Str(v)) = constant {
        cat.pass("__version__", format!("__version__ = \"{v}\""));
        return;
    }

    let imported = statements.iter().any(|s| match s {
        Stmt::ImportFrom(i) => {
            matches!(i.module_leaf(), Some("version" | "_version")) && i.imports("__version__")
        }
        _ => false,
    });
    if imported {
        cat.pass("__version__", "__version__ imported from .version module");
        return;
    }

    let dynamic = constant.is_some_and(|v| is_metadata_version_call(module, v))
        || class_version == Some(&AttrValue::DynamicVersion);
    if dynamic {
        cat.pass(
            "__version__",
            "Version via importlib.metadata (modern pattern)",
        );
    } else {
        cat.warn("__version__", "__version__ not found at module level");
    }
}
