//! Check the Django app layout NetBox expects from a plugin package.

use std::path::Path;

use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError, Severity};
use nbaudit_python::parse_module;
use tracing::debug;

/// Check name for django-app.
pub const NAME: &str = "django-app";

const API_FILES: &[(&str, &str)] = &[
    ("__init__.py", "api_init"),
    ("serializers.py", "api_serializers"),
    ("urls.py", "api_urls"),
    ("views.py", "api_views"),
];

/// Validates urls/views/models, migrations, NetBox plugin modules and the
/// REST API package.
#[derive(Debug, Clone, Default)]
pub struct DjangoApp;

impl DjangoApp {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for DjangoApp {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Django Structure"
    }

    fn tag(&self) -> &'static str {
        "D"
    }

    fn description(&self) -> &'static str {
        "urls/views/models, migrations, navigation, tables, filtersets, forms and api/"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let Some(pkg) = ctx.package_dir.as_deref() else {
            cat.error("package", "No package directory to check");
            return Ok(cat);
        };

        if pkg.join("urls.py").is_file() {
            cat.pass("urls_py", "urls.py exists");
        } else {
            cat.info("urls_py", "urls.py not found (OK if no custom views)");
        }

        let has_views = pkg.join("views.py").is_file() || pkg.join("views").is_dir();
        if has_views {
            cat.pass("views_py", "views.py exists");
        } else {
            cat.info("views_py", "views.py not found (OK if no custom views)");
        }

        let models_file = pkg.join("models.py");
        let models_dir = pkg.join("models");
        let has_models = if models_file.is_file() {
            defines_models(&models_file)
        } else if models_dir.is_dir() {
            AuditContext::python_files(&models_dir)
                .iter()
                .filter(|p| p.file_name().is_some_and(|n| n != "__init__.py"))
                .any(|p| defines_models(p))
        } else {
            false
        };
        if models_file.is_file() || models_dir.is_dir() {
            cat.pass("models_py", "models.py exists");
        } else {
            cat.info("models_py", "models.py not found (OK if no custom models)");
        }

        check_migrations(&mut cat, pkg, has_models)?;

        if pkg.join("navigation.py").is_file() {
            cat.pass("navigation_py", "navigation.py exists");
        } else if has_views {
            cat.info(
                "navigation_py",
                "navigation.py not found (views exist, consider adding)",
            );
        } else {
            cat.info("navigation_py", "navigation.py not found");
        }

        for module in ["tables", "filtersets"] {
            let file = format!("{module}.py");
            let id = format!("{module}_py");
            if pkg.join(&file).is_file() {
                cat.pass(id, format!("{file} exists"));
            } else if has_models {
                cat.info(id, format!("{file} not found (models exist, consider adding)"));
            }
        }

        if pkg.join("forms.py").is_file() {
            cat.pass("forms_py", "forms.py exists");
        } else if has_models && has_views {
            cat.info(
                "forms_py",
                "forms.py not found (models+views exist, consider adding)",
            );
        }

        for module in ["template_content", "graphql"] {
            let file = format!("{module}.py");
            if pkg.join(&file).is_file() {
                cat.pass(format!("{module}_py"), format!("{file} exists"));
            }
        }

        let api = pkg.join("api");
        if api.is_dir() {
            cat.pass("api_dir", "api/ directory exists");
            for &(file, id) in API_FILES {
                if api.join(file).is_file() {
                    cat.pass(id, format!("api/{file} exists"));
                } else {
                    cat.warn(id, format!("api/{file} missing"));
                }
            }
        } else if has_models {
            cat.info(
                "api_dir",
                "api/ directory not found (models exist, consider adding)",
            );
        }

        Ok(cat)
    }
}

fn check_migrations(
    cat: &mut CategoryResult,
    pkg: &Path,
    has_models: bool,
) -> Result<(), CheckError> {
    let dir = pkg.join("migrations");
    if !has_models {
        if dir.is_dir() {
            cat.pass("migrations_dir", "migrations/ directory exists");
        }
        return Ok(());
    }

    if !dir.is_dir() {
        cat.warn(
            "migrations_dir",
            "migrations/ not found (models defined but no migrations)",
        );
        return Ok(());
    }

    if dir.join("__init__.py").is_file() {
        cat.pass("migrations_init", "migrations/__init__.py exists");
    } else {
        cat.error("migrations_init", "migrations/__init__.py missing (required)");
    }

    let count = std::fs::read_dir(&dir)
        .map_err(|e| CheckError::io(&dir, e))?
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".py") && n != "__init__.py")
        .count();
    if count > 0 {
        cat.pass("migrations_count", format!("{count} migration file(s) found"));
    } else {
        cat.push(
            "migrations_count",
            Severity::Warning,
            "No migration files (models defined but no migrations)",
        );
    }
    Ok(())
}

/// Returns true if the module defines a top-level class with a `*Model*` base.
fn defines_models(path: &Path) -> bool {
    let Ok(source) = std::fs::read_to_string(path) else {
        return false;
    };
    match parse_module(&source) {
        Ok(module) => module.classes().any(|c| {
            c.bases
                .iter()
                .any(|b| crate::util::last_segment(b).contains("Model"))
        }),
        Err(e) => {
            debug!("Cannot parse {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;

    const MODELS: &str =
        "from netbox.models import NetBoxModel\n\nclass Widget(NetBoxModel):\n    pass\n";

    #[test]
    fn models_without_migrations_warn() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/models.py", MODELS),
        ]);
        let cat = DjangoApp::new().run(&ctx).unwrap();
        assert_eq!(cat.get("migrations_dir").unwrap().severity, Severity::Warning);
        assert_eq!(cat.get("tables_py").unwrap().severity, Severity::Info);
        assert_eq!(cat.get("api_dir").unwrap().severity, Severity::Info);
    }

    #[test]
    fn models_with_migrations_pass() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/models/__init__.py", ""),
            ("netbox_demo/models/widget.py", MODELS),
            ("netbox_demo/migrations/__init__.py", ""),
            ("netbox_demo/migrations/0001_initial.py", ""),
            ("netbox_demo/api/__init__.py", ""),
            ("netbox_demo/api/serializers.py", ""),
            ("netbox_demo/api/urls.py", ""),
        ]);
        let cat = DjangoApp::new().run(&ctx).unwrap();
        assert_eq!(
            cat.get("migrations_count").unwrap().message,
            "1 migration file(s) found"
        );
        assert_eq!(cat.get("api_views").unwrap().severity, Severity::Warning);
    }

    #[test]
    fn modelless_plugin_skips_model_advice() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/models.py", "X = 1\n"),
        ]);
        let cat = DjangoApp::new().run(&ctx).unwrap();
        assert!(cat.get("migrations_dir").is_none());
        assert!(cat.get("tables_py").is_none());
        assert_eq!(cat.get("models_py").unwrap().severity, Severity::Pass);
    }

    #[test]
    fn no_package() {
        let (_dir, ctx) = fixture(&[]);
        let cat = DjangoApp::new().run(&ctx).unwrap();
        assert_eq!(cat.total(), 1);
        assert_eq!(cat.errors(), 1);
    }
}
