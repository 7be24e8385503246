//! Scan plugin sources for common security mistakes.

use std::path::Path;
use std::sync::LazyLock;

use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError};
use regex::Regex;
use tracing::debug;

use crate::util::regex;

/// Check name for security.
pub const NAME: &str = "security";

const MAX_SECRETS: usize = 5;
const MAX_VERIFY: usize = 3;
const MAX_TIMEOUT: usize = 3;
const CALL_WINDOW: usize = 500;

/// Directories inside the package that are never scanned.
const SCAN_SKIPPED: &[&str] = &["migrations", ".eggs"];

const SENSITIVE_FILES: &[&str] = &[
    ".env",
    ".env.local",
    "credentials.json",
    "secrets.yml",
    "secrets.yaml",
];

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            regex(r#"(?i)(?:password|passwd|pwd)\s*=\s*['"][^'"]{3,}['"]"#),
            "Hardcoded password",
        ),
        (
            regex(r#"(?i)(?:secret_key|api_key|apikey|token)\s*=\s*['"][^'"]{8,}['"]"#),
            "Hardcoded secret/API key",
        ),
        (
            regex(r#"(?i)SECRET_KEY\s*=\s*['"][^'"]+['"]"#),
            "Django SECRET_KEY in code",
        ),
        (
            regex(r#"(?i)(?:aws_access_key|aws_secret)\s*=\s*['"][^'"]+['"]"#),
            "Hardcoded AWS credentials",
        ),
    ]
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r#"(?i)['"](?:changeme|replace|your_|example|xxx|placeholder|todo|fixme|default|test)"#)
});

static VERIFY_FALSE: LazyLock<Regex> = LazyLock::new(|| regex(r"verify\s*=\s*False"));

static CONFIGURABLE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)settings|config|PLUGIN|get_plugin_config"));

static REQUESTS_CALL: LazyLock<Regex> =
    LazyLock::new(|| regex(r"requests\.(?:get|post|put|delete|patch)\("));

static PERMISSION_MIXIN: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"PermissionRequiredMixin|LoginRequiredMixin|ObjectPermissionRequiredMixin|permission_required",
    )
});

// NetBox generic views enforce object permissions themselves.
static GENERIC_VIEW: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"ObjectView|ObjectListView|ObjectEditView|ObjectDeleteView|ObjectChildrenView|BulkEditView")
});

/// Flags hardcoded secrets, disabled TLS verification, requests without
/// timeouts, unprotected views and committed credential files.
#[derive(Debug, Clone, Default)]
pub struct Security;

impl Security {
    /// Creates a new check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Security {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "Security"
    }

    fn tag(&self) -> &'static str {
        "S"
    }

    fn description(&self) -> &'static str {
        "Hardcoded secrets, verify=False, request timeouts, view permissions, .env files"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let Some(pkg) = ctx.package_dir.as_deref() else {
            cat.error("package", "No package directory to check");
            return Ok(cat);
        };

        let sources = scan_sources(ctx, pkg);

        let secrets: Vec<String> = sources
            .iter()
            .flat_map(|(rel, content)| {
                SECRET_PATTERNS
                    .iter()
                    .filter(|(pattern, _)| {
                        pattern
                            .find_iter(content)
                            .any(|m| !PLACEHOLDER.is_match(m.as_str()))
                    })
                    .map(move |(_, desc)| format!("{rel}: {desc}"))
            })
            .collect();
        if secrets.is_empty() {
            cat.pass("no_secrets", "No hardcoded secrets detected");
        } else {
            for finding in secrets.into_iter().take(MAX_SECRETS) {
                cat.warn("hardcoded_secret", finding);
            }
        }

        let unverified: Vec<String> = sources
            .iter()
            .flat_map(|(rel, content)| {
                unconfigurable_verify_lines(content)
                    .into_iter()
                    .map(move |line| format!("{rel}:{line}"))
            })
            .collect();
        if unverified.is_empty() {
            cat.pass("ssl_verify", "No non-configurable verify=False found");
        } else {
            for loc in unverified.iter().take(MAX_VERIFY) {
                cat.warn("ssl_verify", format!("verify=False not configurable: {loc}"));
            }
        }

        let no_timeout: Vec<String> = sources
            .iter()
            .flat_map(|(rel, content)| {
                calls_without_timeout(content)
                    .into_iter()
                    .map(move |line| format!("{rel}:{line}"))
            })
            .collect();
        if no_timeout.is_empty() {
            cat.pass("request_timeout", "All requests calls include timeout");
        } else {
            for loc in no_timeout.iter().take(MAX_TIMEOUT) {
                cat.warn(
                    "request_timeout",
                    format!("requests call missing timeout: {loc}"),
                );
            }
            if no_timeout.len() > MAX_TIMEOUT {
                cat.warn(
                    "request_timeout",
                    format!(
                        "... and {} more missing timeout(s)",
                        no_timeout.len() - MAX_TIMEOUT
                    ),
                );
            }
        }

        check_view_permissions(&mut cat, pkg);

        let committed: Vec<&str> = SENSITIVE_FILES
            .iter()
            .copied()
            .filter(|f| ctx.is_file(f))
            .collect();
        if committed.is_empty() {
            cat.pass("no_env_files", "No .env or credential files in repo");
        } else {
            for file in committed {
                cat.warn("env_file", format!("Sensitive file in repo: {file}"));
            }
        }

        if let Some(gitignore) = ctx.read(".gitignore") {
            if gitignore.contains(".env") {
                cat.pass("gitignore_env", ".env in .gitignore");
            } else {
                cat.info("gitignore_env", ".env not in .gitignore");
            }
        }

        Ok(cat)
    }
}

/// Package sources as `(root-relative path, content)`; unreadable files are skipped.
fn scan_sources(ctx: &AuditContext, pkg: &Path) -> Vec<(String, String)> {
    AuditContext::python_files(pkg)
        .into_iter()
        .filter(|p| {
            p.strip_prefix(pkg).is_ok_and(|rel| {
                !rel.components()
                    .any(|c| SCAN_SKIPPED.iter().any(|s| c.as_os_str() == *s))
            })
        })
        .filter_map(|p| match std::fs::read_to_string(&p) {
            Ok(content) => Some((ctx.display_path(&p), content)),
            Err(e) => {
                debug!("Skipping {}: {}", p.display(), e);
                None
            }
        })
        .collect()
}

/// 1-based lines with `verify=False` and no settings reference nearby.
fn unconfigurable_verify_lines(content: &str) -> Vec<usize> {
    if !VERIFY_FALSE.is_match(content) {
        return Vec::new();
    }
    let lines: Vec<&str> = content.split('\n').collect();
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| VERIFY_FALSE.is_match(line))
        .filter(|&(idx, _)| {
            let start = idx.saturating_sub(4);
            let end = (idx + 6).min(lines.len());
            !CONFIGURABLE.is_match(&lines[start..end].join("\n"))
        })
        .map(|(idx, _)| idx + 1)
        .collect()
}

/// 1-based lines of `requests.<verb>(` calls whose argument list lacks `timeout`.
fn calls_without_timeout(content: &str) -> Vec<usize> {
    REQUESTS_CALL
        .find_iter(content)
        .filter(|m| {
            let window: String = content[m.start()..].chars().take(CALL_WINDOW).collect();
            let call = window.split(')').next().unwrap_or_default();
            !call.contains("timeout")
        })
        .map(|m| content[..m.start()].matches('\n').count() + 1)
        .collect()
}

fn check_view_permissions(cat: &mut CategoryResult, pkg: &Path) {
    let mut view_files = Vec::new();
    let views_py = pkg.join("views.py");
    if views_py.is_file() {
        view_files.push(views_py);
    }
    let views_dir = pkg.join("views");
    if let Ok(entries) = std::fs::read_dir(&views_dir) {
        let mut nested: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|e| e == "py")
                    && p.file_name().is_some_and(|n| n != "__init__.py")
            })
            .collect();
        nested.sort();
        view_files.extend(nested);
    }
    if view_files.is_empty() {
        return;
    }

    let protected = view_files.iter().any(|path| {
        std::fs::read_to_string(path)
            .is_ok_and(|c| PERMISSION_MIXIN.is_match(&c) || GENERIC_VIEW.is_match(&c))
    });
    if protected {
        cat.pass("view_permissions", "Views use permission checks");
    } else {
        cat.warn("view_permissions", "Views may lack permission checks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use nbaudit_core::Severity;

    #[test]
    fn clean_package_passes() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            (
                "netbox_demo/views.py",
                "from netbox.views import generic\n\nclass WidgetView(generic.ObjectView):\n    pass\n",
            ),
            (
                "netbox_demo/client.py",
                "import requests\n\ndef fetch(url):\n    return requests.get(url, timeout=10)\n",
            ),
            (".gitignore", ".env\n"),
        ]);
        let cat = Security::new().run(&ctx).unwrap();
        assert_eq!(cat.passed(), cat.total(), "{cat:#?}");
    }

    #[test]
    fn secrets_are_reported_and_placeholders_ignored() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/settings.py", "API_KEY = 'abcd1234efgh5678'\n"),
            ("netbox_demo/example.py", "password = 'changeme'\n"),
            ("netbox_demo/migrations/0001.py", "password = 'hunter22'\n"),
        ]);
        let cat = Security::new().run(&ctx).unwrap();
        let findings: Vec<_> = cat
            .results()
            .iter()
            .filter(|r| r.name == "hardcoded_secret")
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(findings, ["netbox_demo/settings.py: Hardcoded secret/API key"]);
    }

    #[test]
    fn verify_false_respects_settings_context() {
        let content = "import requests\n\n\n\n\n\n\n\ndef a():\n    requests.get(u, verify=False, timeout=5)\n\n\n\n\n\n\n\n\ndef b():\n    verify = get_plugin_config('netbox_demo', 'verify')\n    requests.get(u, verify=False, timeout=5)\n";
        assert_eq!(unconfigurable_verify_lines(content), vec![10]);
    }

    #[test]
    fn timeout_overflow_line() {
        let body = "import requests\n".to_owned() + &"requests.post(url)\n".repeat(5);
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/sync.py", body.as_str()),
        ]);
        let cat = Security::new().run(&ctx).unwrap();
        let messages: Vec<_> = cat
            .results()
            .iter()
            .filter(|r| r.name == "request_timeout")
            .map(|r| r.message.clone())
            .collect();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], "requests call missing timeout: netbox_demo/sync.py:2");
        assert_eq!(messages[3], "... and 2 more missing timeout(s)");
    }

    #[test]
    fn unprotected_views_and_env_files_warn() {
        let (_dir, ctx) = fixture(&[
            ("netbox_demo/__init__.py", ""),
            ("netbox_demo/views/__init__.py", ""),
            (
                "netbox_demo/views/raw.py",
                "from django.views import View\n\nclass Raw(View):\n    pass\n",
            ),
            (".env", "SECRET=1\n"),
            (".gitignore", "*.pyc\n"),
        ]);
        let cat = Security::new().run(&ctx).unwrap();
        assert_eq!(cat.get("view_permissions").unwrap().severity, Severity::Warning);
        assert_eq!(cat.get("env_file").unwrap().message, "Sensitive file in repo: .env");
        assert_eq!(cat.get("gitignore_env").unwrap().severity, Severity::Info);
    }
}
