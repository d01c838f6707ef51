//! Interactive menu, the default when no subcommand is given.

use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use repotrack::{RecordStore, RepositoryRef};

use crate::commands::shared::{AppContext, CliResult, OutputFormat};
use crate::commands::{commits, refresh, repo};

const COMMITS_SHOWN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Track,
    List,
    Commits,
    Pull,
    Authors,
    Refresh,
    Remove,
    Quit,
}

impl MenuAction {
    const ALL: [Self; 8] = [
        Self::Track,
        Self::List,
        Self::Commits,
        Self::Pull,
        Self::Authors,
        Self::Refresh,
        Self::Remove,
        Self::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Track => "Track a repository",
            Self::List => "List tracked repositories",
            Self::Commits => "Browse commits",
            Self::Pull => "Pull commits",
            Self::Authors => "Top authors",
            Self::Refresh => "Refresh everything now",
            Self::Remove => "Stop tracking a repository",
            Self::Quit => "Quit",
        }
    }
}

pub(crate) async fn handle_menu(ctx: &AppContext) -> CliResult {
    if !Term::stdout().is_term() {
        return Err("the interactive menu needs a terminal; see `repotrack --help`".into());
    }

    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();

    loop {
        if ctx.cancel.is_cancelled() {
            return Ok(());
        }

        let choice = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_opt()?;
        let action = match choice {
            Some(i) => MenuAction::ALL[i],
            None => MenuAction::Quit,
        };

        // Errors from a single action are shown and the menu continues.
        let outcome = run_action(ctx, &theme, action).await;
        match outcome {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => eprintln!("{} {e}", style("Error:").red().bold()),
        }
        println!();
    }
}

/// Returns `false` when the menu should exit.
async fn run_action(ctx: &AppContext, theme: &ColorfulTheme, action: MenuAction) -> CliResult<bool> {
    match action {
        MenuAction::Quit => return Ok(false),
        MenuAction::Track => {
            let url: String = Input::with_theme(theme)
                .with_prompt("Repository URL (e.g. https://github.com/owner/name)")
                .interact_text()?;
            repo::handle_add(ctx, &url, true).await?;
        }
        MenuAction::List => repo::handle_list(ctx, OutputFormat::Table).await?,
        MenuAction::Refresh => refresh::handle_refresh(ctx).await?,
        MenuAction::Commits | MenuAction::Pull | MenuAction::Authors | MenuAction::Remove => {
            let Some(selected) = pick_repository(ctx, theme).await? else {
                return Ok(true);
            };
            let key = selected.id.to_string();

            match action {
                MenuAction::Commits => {
                    commits::handle_commits(ctx, &key, COMMITS_SHOWN, OutputFormat::Table).await?
                }
                MenuAction::Pull => commits::handle_pull(ctx, &key, None, false).await?,
                MenuAction::Authors => {
                    repo::handle_authors(ctx, &key, None, OutputFormat::Table).await?
                }
                _ => repo::handle_remove(ctx, &key, false).await?,
            }
        }
    }
    Ok(true)
}

async fn pick_repository(
    ctx: &AppContext,
    theme: &ColorfulTheme,
) -> CliResult<Option<RepositoryRef>> {
    let mut repos = ctx.store.list_repositories().await?;
    if repos.is_empty() {
        println!("No repositories tracked yet.");
        return Ok(None);
    }

    let items: Vec<String> = repos
        .iter()
        .map(|r| format!("{} ({} stars)", r.full_name, r.stars))
        .collect();
    let choice = Select::with_theme(theme)
        .with_prompt("Repository")
        .items(&items)
        .default(0)
        .interact_opt()?;

    Ok(choice.map(|i| repos.swap_remove(i)))
}
