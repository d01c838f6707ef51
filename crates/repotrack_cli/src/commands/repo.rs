use std::sync::Arc;

use console::style;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use repotrack::RecordStore;

use crate::commands::shared::{
    AppContext, AuthorRow, CliResult, OutputFormat, RepositoryRow, print_json, print_table,
};
use crate::progress::ProgressReporter;

/// Start tracking a repository: store its metadata and, unless told
/// otherwise, its full commit history.
pub(crate) async fn handle_add(ctx: &AppContext, url: &str, with_commits: bool) -> CliResult {
    let reporter = Arc::new(ProgressReporter::new());
    let tracker = ctx.tracker(&reporter)?;

    let repo = tracker.fetch_repository(url).await?;
    println!(
        "Tracking {} (id {}): {} stars, {} forks",
        style(&repo.full_name).bold(),
        repo.id,
        repo.stars,
        repo.forks
    );

    if with_commits {
        let result = tracker.fetch_commits(&repo.url, None).await;
        reporter.finish();
        let records = result?;
        println!("Stored {} commits.", records.len());
    }

    Ok(())
}

pub(crate) async fn handle_list(ctx: &AppContext, output: OutputFormat) -> CliResult {
    let repos = ctx.store.list_repositories().await?;

    match output {
        OutputFormat::Json => print_json(&repos)?,
        OutputFormat::Table if repos.is_empty() => {
            println!("No repositories tracked yet. Add one with: repotrack add <url>");
        }
        OutputFormat::Table => print_table(repos.iter().map(RepositoryRow::from).collect()),
    }

    Ok(())
}

/// Stop tracking a repository, deleting its stored commits.
pub(crate) async fn handle_remove(ctx: &AppContext, repo: &str, yes: bool) -> CliResult {
    let repo = ctx.resolve_repository(repo).await?;

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Remove {} and all of its stored commits?",
                repo.full_name
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    ctx.store.delete_repository(repo.id).await?;
    tracing::info!(repository = %repo.full_name, id = repo.id, "Repository removed");
    println!("Removed {}.", repo.full_name);
    Ok(())
}

pub(crate) async fn handle_authors(
    ctx: &AppContext,
    repo: &str,
    limit: Option<u64>,
    output: OutputFormat,
) -> CliResult {
    let repo = ctx.resolve_repository(repo).await?;
    let limit = limit.unwrap_or(ctx.config.display.top_authors);
    let authors = ctx.store.top_authors(repo.id, limit).await?;

    match output {
        OutputFormat::Json => print_json(&authors)?,
        OutputFormat::Table if authors.is_empty() => {
            println!(
                "No commits stored for {}. Pull them with: repotrack pull {}",
                repo.full_name, repo.full_name
            );
        }
        OutputFormat::Table => {
            println!("Top authors of {}:", style(&repo.full_name).bold());
            print_table(AuthorRow::ranked(&authors));
        }
    }

    Ok(())
}
