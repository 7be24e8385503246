//! Check repository health through the GitHub REST API.

use std::sync::LazyLock;
use std::time::Duration;

use nbaudit_core::process::{run_tool, ToolOutcome};
use nbaudit_core::{AuditContext, CategoryResult, Check, CheckError, CheckGroup};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::http::HttpClient;
use crate::util::regex;

/// Check name for github.
pub const NAME: &str = "github";

const API_BASE: &str = "https://api.github.com/repos";
const STANDARD_BRANCHES: &[&str] = &["main", "master", "develop", "dev"];

static GITHUB_REMOTE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"github\.com[/:]([^/]+/[^/.]+?)(?:\.git)?$"));

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    pushed_at: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default = "default_true")]
    has_issues: bool,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct IssueInfo {
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

/// Reports archive state, activity, issue and pull request backlog.
pub struct GitHub {
    client: Box<dyn HttpClient>,
    git_timeout: Duration,
}

impl GitHub {
    /// Creates a new check querying through `client`.
    #[must_use]
    pub fn new(client: Box<dyn HttpClient>, git_timeout: Duration) -> Self {
        Self {
            client,
            git_timeout,
        }
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let body = self
            .client
            .get_json(url)
            .inspect_err(|e| debug!("GitHub request failed: {}", e))
            .ok()?;
        serde_json::from_str(&body)
            .inspect_err(|e| debug!("Unexpected GitHub response from {}: {}", url, e))
            .ok()
    }

    /// Builds the category for `owner/repo` as of `now`.
    fn report(&self, repo: &str, now: OffsetDateTime) -> CategoryResult {
        let mut cat = CategoryResult::new(self.title(), self.tag());

        let Some(info) = self.fetch::<RepoInfo>(&format!("{API_BASE}/{repo}")) else {
            cat.info("github_api", "Could not fetch GitHub repo data");
            return cat;
        };

        if info.archived {
            cat.error("archived", "Repository is archived (no longer maintained)");
        } else {
            cat.pass("archived", "Repository is not archived");
        }

        if let Some(days) = info.pushed_at.as_deref().and_then(|t| days_since(t, now)) {
            match days {
                d if d <= 90 => cat.pass("last_push", format!("Last push: {d} days ago (active)")),
                d if d <= 365 => cat.warn(
                    "last_push",
                    format!("Last push: {days} days ago (may be stale)"),
                ),
                _ => cat.error(
                    "last_push",
                    format!("Last push: {days} days ago (likely unmaintained)"),
                ),
            }
        }

        cat.pass(
            "community",
            format!(
                "Stars: {}, Forks: {}",
                info.stargazers_count, info.forks_count
            ),
        );

        if info.has_issues {
            cat.pass("issues_enabled", "Issues are enabled");
            self.check_issues(&mut cat, repo, info.open_issues_count, now);
        } else {
            cat.info("issues_enabled", "Issues are disabled on this repository");
        }

        let pulls_url = format!("{API_BASE}/{repo}/pulls?state=open&per_page=100");
        if let Some(pulls) = self.fetch::<Vec<serde_json::Value>>(&pulls_url) {
            match pulls.len() {
                0 => cat.pass("open_prs", "No open pull requests"),
                n @ 1..=5 => cat.pass("open_prs", format!("{n} open pull request(s)")),
                n @ 6..=15 => cat.warn(
                    "open_prs",
                    format!("{n} open pull requests (review backlog)"),
                ),
                n => cat.warn(
                    "open_prs",
                    format!("{n} open pull requests (significant backlog)"),
                ),
            }
        }

        let branch = info.default_branch.as_str();
        if STANDARD_BRANCHES.contains(&branch) {
            cat.pass("default_branch", format!("Default branch: {branch}"));
        } else if !branch.is_empty() {
            cat.info(
                "default_branch",
                format!("Default branch: {branch} (non-standard)"),
            );
        }

        cat
    }

    fn check_issues(&self, cat: &mut CategoryResult, repo: &str, open: u64, now: OffsetDateTime) {
        match open {
            0 => cat.pass("open_issues", "No open issues"),
            1..=20 => cat.pass("open_issues", format!("{open} open issues")),
            21..=50 => cat.warn(
                "open_issues",
                format!("{open} open issues (consider triaging)"),
            ),
            _ => cat.warn(
                "open_issues",
                format!("{open} open issues (significant backlog)"),
            ),
        }

        let url =
            format!("{API_BASE}/{repo}/issues?state=open&sort=updated&direction=asc&per_page=5");
        let Some(issues) = self.fetch::<Vec<IssueInfo>>(&url) else {
            return;
        };
        // The issues endpoint also lists pull requests.
        let stale_days = issues
            .iter()
            .find(|i| i.pull_request.is_none())
            .and_then(|i| i.updated_at.as_deref())
            .and_then(|t| days_since(t, now));
        match stale_days {
            Some(days) if days > 365 => cat.warn(
                "stale_issues",
                format!("Oldest open issue untouched for {days} days"),
            ),
            Some(days) if days > 180 => cat.info(
                "stale_issues",
                format!("Oldest open issue untouched for {days} days"),
            ),
            Some(_) => cat.pass("stale_issues", "No significantly stale issues"),
            None => {}
        }
    }
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("git_timeout", &self.git_timeout)
            .finish_non_exhaustive()
    }
}

impl Check for GitHub {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self) -> &'static str {
        "GitHub Health"
    }

    fn tag(&self) -> &'static str {
        "G"
    }

    fn group(&self) -> CheckGroup {
        CheckGroup::Network
    }

    fn description(&self) -> &'static str {
        "Archived, last push, stars/forks, issues, stale issues, open PRs, default branch"
    }

    fn run(&self, ctx: &AuditContext) -> Result<CategoryResult, CheckError> {
        let outcome = run_tool(
            "git",
            &["remote", "get-url", "origin"],
            &ctx.root,
            self.git_timeout,
        )
        .map_err(|source| CheckError::Process {
            tool: "git".to_owned(),
            source,
        })?;

        let repo = match outcome {
            ToolOutcome::Completed(out) if out.success() => github_repo(out.stdout.trim()),
            _ => None,
        };
        let Some(repo) = repo else {
            let mut cat = CategoryResult::new(self.title(), self.tag());
            cat.info("github_repo", "Not a GitHub repository (skipped)");
            return Ok(cat);
        };

        Ok(self.report(&repo, OffsetDateTime::now_utc()))
    }
}

/// `owner/repo` from an HTTPS or SSH GitHub remote URL.
fn github_repo(remote: &str) -> Option<String> {
    GITHUB_REMOTE
        .captures(remote)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn days_since(timestamp: &str, now: OffsetDateTime) -> Option<i64> {
    OffsetDateTime::parse(timestamp, &Rfc3339)
        .map(|t| (now - t).whole_days())
        .inspect_err(|e| debug!("Bad timestamp {}: {}", timestamp, e))
        .ok()
}
