//! Parses realistic plugin entry-point files end to end.

use nbaudit_python::{parse_module, Expr, Stmt};

const PLUGIN_INIT: &str = r#""""NetBox demo plugin."""

from importlib.metadata import metadata

from netbox.plugins import PluginConfig

from .version import __version__

_meta = metadata("netbox-demo")


class DemoConfig(PluginConfig):
    name = "netbox_demo"
    verbose_name = "Demo"
    description = _meta.get("Summary")
    version = __version__
    author = "Jane Doe"
    author_email = "jane@example.com"
    base_url = "demo"
    min_version = "4.1.0"
    max_version = "4.2.99"
    default_settings = {
        "top_level_menu": True,
    }

    def ready(self):
        super().ready()
        from . import widgets  # noqa: F401


config = DemoConfig
"#;

#[test]
fn plugin_config_shape() {
    let module = parse_module(PLUGIN_INIT).unwrap();

    let class = module.class("DemoConfig").unwrap();
    assert!(class.inherits("PluginConfig"));
    assert_eq!(
        class.assignment("min_version").and_then(|a| a.value.as_str()),
        Some("4.1.0")
    );
    assert_eq!(
        class.assignment("version").map(|a| &a.value),
        Some(&Expr::Name("__version__".into()))
    );
    assert!(matches!(
        class.assignment("default_settings").map(|a| &a.value),
        Some(Expr::Dict(_))
    ));

    let ready = class.method("ready").unwrap();
    assert!(ready
        .walk()
        .iter()
        .any(|s| matches!(s, Stmt::ImportFrom(i) if i.level == 1 && i.imports("widgets"))));

    let version_import = module
        .imports_from()
        .find(|i| i.imports("__version__"))
        .unwrap();
    assert_eq!(version_import.module_leaf(), Some("version"));
}

#[test]
fn malformed_source_never_panics() {
    let samples = [
        "class",
        "def f(:",
        "if True\n    pass",
        "))))",
        "from . import",
    ];
    for sample in samples {
        let err = parse_module(sample).unwrap_err();
        assert!(err.line >= 1, "{sample:?} gave line {}", err.line);
    }
}
