use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use repotrack::{
    AuthorStats, CommitRecord, DbStore, GitHubClient, RecordStore, RepositoryId, RepositoryRef,
    Tracker, sanitize_repo_url,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::progress::ProgressReporter;

pub(crate) type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Longest commit summary shown in tables.
const SUMMARY_WIDTH: usize = 72;

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Everything a command needs once the database is open.
pub(crate) struct AppContext {
    pub(crate) config: Config,
    pub(crate) store: Arc<DbStore>,
    pub(crate) cancel: CancellationToken,
}

impl AppContext {
    /// Connect, bring the schema up to date and wrap the store.
    pub(crate) async fn open(
        config: Config,
        database_url: &str,
        cancel: CancellationToken,
    ) -> CliResult<Self> {
        let db = repotrack::connect_and_migrate(database_url).await?;
        Ok(Self {
            config,
            store: Arc::new(DbStore::new(db)),
            cancel,
        })
    }

    pub(crate) fn client(&self) -> CliResult<GitHubClient> {
        let token = self.config.github_token();
        if token.is_none() {
            tracing::warn!(
                "No GitHub token configured; unauthenticated requests are limited to 60 per hour"
            );
        }

        let mut client = GitHubClient::new(token)?.with_cancellation(self.cancel.clone());
        if let Some(rps) = self.config.refresh.requests_per_second {
            client = client.with_pacing(rps);
        }
        Ok(client)
    }

    pub(crate) fn tracker(&self, reporter: &Arc<ProgressReporter>) -> CliResult<Tracker> {
        let store: Arc<dyn RecordStore> = self.store.clone();
        Ok(Tracker::new(self.client()?, store).with_progress(reporter.as_callback()))
    }

    /// Look up a tracked repository by id, `owner/name`, web URL or API URL.
    pub(crate) async fn resolve_repository(&self, arg: &str) -> CliResult<RepositoryRef> {
        let arg = arg.trim();
        let found = match arg.parse::<RepositoryId>() {
            Ok(id) => self.store.find_repository_by_id(id).await?,
            Err(_) => {
                let url = repository_api_url(arg)?;
                self.store.find_repository_by_url(&url).await?
            }
        };

        found.ok_or_else(|| {
            format!(
                "Repository '{}' is not tracked. Add it first with: repotrack add {}",
                arg, arg
            )
            .into()
        })
    }
}

/// Normalize `owner/name` shorthand and URLs to the API URL used as the
/// repository key.
pub(crate) fn repository_api_url(arg: &str) -> CliResult<String> {
    let arg = arg.trim();
    let url = if arg.contains("://") {
        sanitize_repo_url(arg)?
    } else if arg.starts_with("github.com/") || arg.starts_with("www.github.com/") {
        sanitize_repo_url(&format!("https://{arg}"))?
    } else {
        sanitize_repo_url(&format!("https://github.com/{arg}"))?
    };
    Ok(url)
}

/// Parse a `--since` value: RFC 3339, or a bare date meaning midnight UTC.
pub(crate) fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{value}', expected YYYY-MM-DD or RFC 3339"))
}

pub(crate) fn print_table<T: tabled::Tabled>(rows: Vec<T>) {
    let mut table = tabled::Table::new(rows);
    table.with(tabled::settings::Style::rounded());
    println!("{}", table);
}

pub(crate) fn print_json<T: Serialize + ?Sized>(items: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

#[derive(Debug, Clone, tabled::Tabled)]
pub(crate) struct RepositoryRow {
    #[tabled(rename = "ID")]
    pub id: i32,
    #[tabled(rename = "Repository")]
    pub full_name: String,
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Stars")]
    pub stars: i32,
    #[tabled(rename = "Forks")]
    pub forks: i32,
    #[tabled(rename = "Open Issues")]
    pub open_issues: i32,
    #[tabled(rename = "Synced At")]
    pub synced_at: String,
}

impl From<&RepositoryRef> for RepositoryRow {
    fn from(repo: &RepositoryRef) -> Self {
        Self {
            id: repo.id,
            full_name: repo.full_name.clone(),
            language: repo.language.clone().unwrap_or_else(|| "-".to_string()),
            stars: repo.stars,
            forks: repo.forks,
            open_issues: repo.open_issues,
            synced_at: repo.synced_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, tabled::Tabled)]
pub(crate) struct CommitRow {
    #[tabled(rename = "SHA")]
    pub sha: String,
    #[tabled(rename = "Authored")]
    pub authored_at: String,
    #[tabled(rename = "Author")]
    pub author: String,
    #[tabled(rename = "Summary")]
    pub summary: String,
}

impl From<&CommitRecord> for CommitRow {
    fn from(commit: &CommitRecord) -> Self {
        Self {
            sha: commit.short_sha().to_string(),
            authored_at: commit.authored_at.format("%Y-%m-%d %H:%M").to_string(),
            author: commit.author_name.clone(),
            summary: truncate(commit.summary(), SUMMARY_WIDTH),
        }
    }
}

#[derive(Debug, Clone, tabled::Tabled)]
pub(crate) struct AuthorRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Author")]
    pub name: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Commits")]
    pub commits: i64,
}

impl AuthorRow {
    pub(crate) fn ranked(authors: &[AuthorStats]) -> Vec<Self> {
        authors
            .iter()
            .enumerate()
            .map(|(i, a)| Self {
                rank: i + 1,
                name: a.name.clone(),
                email: a.email.clone(),
                commits: a.commits,
            })
            .collect()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn shorthand_and_urls_map_to_api_url() {
        let expected = "https://api.github.com/repos/octocat/hello-world";
        for arg in [
            "octocat/hello-world",
            "github.com/octocat/hello-world",
            "https://github.com/octocat/hello-world",
            "https://github.com/octocat/hello-world.git",
            " https://api.github.com/repos/octocat/hello-world ",
        ] {
            assert_eq!(repository_api_url(arg).unwrap(), expected, "{arg}");
        }
    }

    #[test]
    fn bare_name_is_rejected() {
        assert!(repository_api_url("hello-world").is_err());
        assert!(repository_api_url("https://gitlab.com/a/b").is_err());
    }

    #[test]
    fn since_accepts_dates_and_timestamps() {
        assert_eq!(
            parse_since("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_since("2024-03-01T12:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap()
        );
        assert!(parse_since("last tuesday").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn authors_are_ranked_from_one() {
        let rows = AuthorRow::ranked(&[
            AuthorStats {
                name: "Mona".to_string(),
                email: "mona@example.com".to_string(),
                commits: 5,
            },
            AuthorStats {
                name: "Hubot".to_string(),
                email: "hubot@example.com".to_string(),
                commits: 2,
            },
        ]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[1].name, "Hubot");
    }
}
