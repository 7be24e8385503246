//! The built-in catalogue run over fixture plugin trees.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nbaudit_checks::{catalog_with_client, core_checks, HttpClient, HttpError};
use nbaudit_core::{CheckRunner, Config, Severity, Summary};

fn write(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
}

/// Counts requests and answers every one with a 404.
#[derive(Clone, Default)]
struct Unreachable(Arc<AtomicUsize>);

impl HttpClient for Unreachable {
    fn get_json(&self, _url: &str) -> Result<String, HttpError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(HttpError::Status { status: 404 })
    }
}

const PYPROJECT: &str = r#"[build-system]
requires = ["setuptools>=61"]
build-backend = "setuptools.build_meta"

[project]
name = "netbox-demo"
version = "0.3.1"
description = "Demo plugin"
readme = "README.md"
license = {text = "Apache-2.0"}
requires-python = ">=3.10"

[project.urls]
Homepage = "https://github.com/acme/netbox-demo"
"#;

const INIT: &str = r#"from netbox.plugins import PluginConfig

__version__ = "0.3.1"


class DemoConfig(PluginConfig):
    name = "netbox_demo"
    verbose_name = "Demo"
    description = "Demo plugin"
    version = __version__
    base_url = "demo"
    min_version = "4.1.0"


config = DemoConfig
"#;

#[test]
fn core_checks_over_a_plugin() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        &[
            ("pyproject.toml", PYPROJECT),
            ("netbox_demo/__init__.py", INIT),
            (
                "netbox_demo/models.py",
                "from netbox.models import NetBoxModel\n\n\nclass Thing(NetBoxModel):\n    pass\n",
            ),
            ("README.md", "# netbox-demo\n"),
            (
                "CHANGELOG.md",
                "# Changelog\n\n## [0.3.1] - 2025-02-01\n\n### Fixed\n\n- Bug\n",
            ),
        ],
    );

    let runner = CheckRunner::builder()
        .root(dir.path())
        .checks(core_checks())
        .build()
        .unwrap();
    let categories = runner.run();
    assert_eq!(categories.len(), 10);

    for cat in &categories {
        assert!(cat.total() > 0, "{} is empty", cat.name);
        assert_eq!(
            cat.total(),
            cat.passed() + cat.errors() + cat.warnings() + cat.infos()
        );
        assert!(cat.get("check_failed").is_none(), "{cat:#?}");
    }

    let summary = Summary::from_categories(&categories);
    assert_eq!(
        summary.total,
        categories.iter().map(nbaudit_core::CategoryResult::total).sum::<usize>()
    );

    let versioning = categories.iter().find(|c| c.tag == "V").unwrap();
    assert_eq!(
        versioning.get("pyproject_match").unwrap().severity,
        Severity::Pass
    );

    let django = categories.iter().find(|c| c.tag == "D").unwrap();
    assert_eq!(
        django.get("migrations_dir").unwrap().message,
        "migrations/ not found (models defined but no migrations)"
    );
}

#[test]
fn missing_manifest_only_degrades_packaging() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), &[("netbox_demo/__init__.py", INIT)]);

    let mut config = Config::default();
    config.runner.skip_lint = true;
    let http = Unreachable::default();
    let calls = Arc::clone(&http.0);
    let checks = catalog_with_client(&config, || Box::new(http.clone()));

    let runner = CheckRunner::builder()
        .root(dir.path())
        .config(config)
        .checks(checks)
        .build()
        .unwrap();
    let categories = runner.run();

    let tags: String = categories.iter().map(|c| c.tag.as_str()).collect();
    assert_eq!(tags, "FCPVLRDWSTGB");

    let packaging = categories.last().unwrap();
    assert_eq!(packaging.total(), 1);
    assert_eq!(packaging.results()[0].severity, Severity::Error);
    assert_eq!(
        packaging.results()[0].message,
        "pyproject.toml not found, cannot build"
    );

    // A temporary directory has no GitHub remote, so nothing is fetched.
    let github = categories.iter().find(|c| c.tag == "G").unwrap();
    assert_eq!(github.total(), 1);
    assert_eq!(github.results()[0].severity, Severity::Info);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
