use std::sync::Arc;

use chrono::{DateTime, Utc};
use console::style;
use repotrack::{ReconcilePolicy, RecordStore};

use crate::commands::shared::{
    AppContext, CliResult, CommitRow, OutputFormat, print_json, print_table,
};
use crate::progress::ProgressReporter;

/// Show stored commits, newest first. A `limit` of 0 shows all of them.
pub(crate) async fn handle_commits(
    ctx: &AppContext,
    repo: &str,
    limit: usize,
    output: OutputFormat,
) -> CliResult {
    let repo = ctx.resolve_repository(repo).await?;
    let mut commits = ctx.store.find_commits_for_repository(repo.id).await?;
    let total = commits.len();
    if limit > 0 {
        commits.truncate(limit);
    }

    match output {
        OutputFormat::Json => print_json(&commits)?,
        OutputFormat::Table if commits.is_empty() => {
            println!(
                "No commits stored for {}. Pull them with: repotrack pull {}",
                repo.full_name, repo.full_name
            );
        }
        OutputFormat::Table => {
            print_table(commits.iter().map(CommitRow::from).collect());
            if commits.len() < total {
                println!(
                    "{}",
                    style(format!("Showing {} of {} commits.", commits.len(), total)).dim()
                );
            }
        }
    }

    Ok(())
}

/// Fetch commits for a tracked repository.
///
/// By default the stored history is replaced; `append` keeps it and only adds
/// commits not already stored.
pub(crate) async fn handle_pull(
    ctx: &AppContext,
    repo: &str,
    since: Option<DateTime<Utc>>,
    append: bool,
) -> CliResult {
    let repo = ctx.resolve_repository(repo).await?;
    let policy = if append {
        ReconcilePolicy::AppendOnly
    } else {
        ReconcilePolicy::ReplaceAll
    };

    let reporter = Arc::new(ProgressReporter::new());
    let tracker = ctx.tracker(&reporter)?;
    let result = tracker.sync_commits(&repo.url, since, policy).await;
    reporter.finish();
    let result = result?;

    println!(
        "{}: fetched {} commits in {} pages, {} new, {} already stored{}",
        style(&repo.full_name).bold(),
        result.fetched,
        result.pages,
        result.inserted,
        result.skipped,
        if result.failed > 0 {
            format!(", {} failed", result.failed)
        } else {
            String::new()
        }
    );
    Ok(())
}
