//! The ordered check catalogue.

use nbaudit_core::{CheckBox, Config};

use crate::http::{HttpClient, ReqwestClient};
use crate::{
    Certification, Changelog, DjangoApp, GitHub, Linting, Packaging, PluginConfig, Pyproject,
    Readme, Security, Structure, Versioning, Workflows,
};

/// Returns every check in report order, wired to real tools and a real
/// HTTP client.
///
/// Order: Structure, PluginConfig, pyproject.toml, Versioning, CHANGELOG,
/// README, Django Structure, Workflows, Security, Certification, GitHub
/// Health, Linting, Packaging.
#[must_use]
pub fn default_catalog(config: &Config) -> Vec<CheckBox> {
    let http = config.timeouts.http();
    catalog_with_client(config, || Box::new(ReqwestClient::new(http)))
}

/// Same as [`default_catalog`], with HTTP clients built by `client`.
#[must_use]
pub fn catalog_with_client<F>(config: &Config, client: F) -> Vec<CheckBox>
where
    F: Fn() -> Box<dyn HttpClient>,
{
    let mut checks = core_checks();
    checks.push(Box::new(GitHub::new(client(), config.timeouts.git())));
    checks.push(Box::new(Linting::new(
        config.tools.python.clone(),
        config.timeouts.lint(),
    )));
    checks.push(Box::new(
        Packaging::new(config.tools.python.clone(), client())
            .timeouts(config.timeouts.build(), config.timeouts.twine())
            .offline(config.runner.offline),
    ));
    checks
}

/// Checks that only read the source tree.
#[must_use]
pub fn core_checks() -> Vec<CheckBox> {
    vec![
        Box::new(Structure::new()),
        Box::new(PluginConfig::new()),
        Box::new(Pyproject::new()),
        Box::new(Versioning::new()),
        Box::new(Changelog::new()),
        Box::new(Readme::new()),
        Box::new(DjangoApp::new()),
        Box::new(Workflows::new()),
        Box::new(Security::new()),
        Box::new(Certification::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbaudit_core::CheckGroup;

    #[test]
    fn catalogue_order_is_fixed() {
        let tags: String = default_catalog(&Config::default())
            .iter()
            .map(|c| c.tag())
            .collect();
        assert_eq!(tags, "FCPVLRDWSTGQB");
    }

    #[test]
    fn names_are_unique() {
        let catalog = default_catalog(&Config::default());
        let mut names: Vec<_> = catalog.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn external_checks_have_groups() {
        let catalog = default_catalog(&Config::default());
        let group = |name: &str| {
            catalog
                .iter()
                .find(|c| c.name() == name)
                .map(|c| c.group())
        };
        assert_eq!(group("github"), Some(CheckGroup::Network));
        assert_eq!(group("linting"), Some(CheckGroup::Lint));
        assert_eq!(group("packaging"), Some(CheckGroup::Build));
        assert!(core_checks().iter().all(|c| c.group() == CheckGroup::Core));
    }
}
