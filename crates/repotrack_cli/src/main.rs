//! repotrack CLI - track GitHub repositories and their commit history.

mod commands;
mod config;
mod logging;
mod progress;
mod shutdown;

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use console::Term;

use crate::commands::shared::{AppContext, CliResult, OutputFormat, parse_since};

#[derive(Parser)]
#[command(name = "repotrack")]
#[command(version)]
#[command(about = "Track GitHub repositories and their commit history")]
#[command(
    long_about = "repotrack keeps a local database of GitHub repositories: their metadata \
(stars, forks, open issues, language) and their full commit history. Tracked \
repositories can be refreshed on demand or on a schedule, and commit authors \
ranked by activity. Run without a subcommand for an interactive menu."
)]
#[command(after_long_help = r#"EXAMPLES
    Start tracking a repository and pull its history:
        $ repotrack add https://github.com/rust-lang/log

    Show the ten most active authors:
        $ repotrack authors rust-lang/log -n 10

    Re-fetch commits since a date, keeping what is stored:
        $ repotrack pull rust-lang/log --since 2024-01-01 --append

    Refresh every tracked repository each six hours:
        $ repotrack watch --interval-hours 6

CONFIGURATION
    repotrack reads configuration from:
      1. ~/.config/repotrack/config.toml (or $XDG_CONFIG_HOME/repotrack/config.toml)
      2. ./repotrack.toml
      3. Environment variables (REPOTRACK_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    REPOTRACK_DATABASE_URL               Database connection string (default: ~/.local/state/repotrack/repotrack.db)
    REPOTRACK_GITHUB_TOKEN               GitHub personal access token
    REPOTRACK_REFRESH_INTERVAL_HOURS     Hours between scheduled refreshes (default: 1; INTERVAL is also read)
    REPOTRACK_REFRESH_REQUESTS_PER_SECOND  Client-side request pacing
    REPOTRACK_DISPLAY_TOP_AUTHORS        Default row count for `authors` (default: 10)
    REPOTRACK_LOGGING_DIR                Directory for app.log and error.log
    RUST_LOG                             Log filter (default: repotrack=info,repotrack_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a repository
    Add {
        /// Repository URL, e.g. https://github.com/owner/name
        url: String,

        /// Only store metadata, don't pull commits
        #[arg(long)]
        no_commits: bool,
    },
    /// List tracked repositories
    List {
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },
    /// Show stored commits of a repository, newest first
    Commits {
        /// Repository id, owner/name or URL
        repo: String,

        /// Number of commits to show (0 for all)
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },
    /// Fetch commits of a tracked repository
    Pull {
        /// Repository id, owner/name or URL
        repo: String,

        /// Only fetch commits authored at or after this date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        /// Keep stored commits and only add new ones
        #[arg(short, long)]
        append: bool,
    },
    /// Rank the authors of a repository by commit count
    Authors {
        /// Repository id, owner/name or URL
        repo: String,

        /// Number of authors to show (default from config or 10; 0 for all)
        #[arg(short = 'n', long)]
        limit: Option<u64>,

        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },
    /// Stop tracking a repository and delete its commits
    Remove {
        /// Repository id, owner/name or URL
        repo: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Refresh metadata and new commits of every tracked repository once
    Refresh,
    /// Refresh every tracked repository on an interval until interrupted
    Watch {
        /// Hours between refreshes (default from config or 1)
        #[arg(short, long)]
        interval_hours: Option<u64>,

        /// Run the first refresh immediately instead of after one interval
        #[arg(long)]
        now: bool,
    },
    /// Interactive menu (the default)
    Menu,
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

/// Create the parent directory of a `sqlite://` database file.
fn ensure_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(db_path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // Strip query parameters (e.g., ?mode=rwc) before path operations
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    let db_path = Path::new(db_path);

    if db_path.is_relative() && !db_path.as_os_str().is_empty() {
        tracing::warn!(
            "Database path '{}' is relative - behavior depends on current directory. \
             Consider using an absolute path.",
            db_path.display()
        );
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Completions don't need logging, config or the database.
    if let Some(Commands::Completions { shell }) = &cli.command {
        return commands::meta::handle_completions(*shell);
    }

    // Load configuration (config files -> env vars -> defaults)
    let (config, config_error) = match config::Config::load() {
        Ok(config) => (config, None),
        Err(e) => (config::Config::default(), Some(e)),
    };

    let interactive = Term::stdout().is_term();
    if let Err(e) = logging::init(config.log_dir().as_deref(), interactive) {
        eprintln!("Warning: {e}; file logging disabled");
    }
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Failed to load configuration, using defaults");
    }

    let cancel = shutdown::install_shutdown_handler();

    let database_url = config
        .database_url()
        .ok_or("cannot determine a database location; set REPOTRACK_DATABASE_URL")?;
    ensure_sqlite_dir(&database_url)?;

    let command = cli.command.unwrap_or(Commands::Menu);
    if let Commands::Migrate { action } = command {
        return commands::migrate::handle_migrate(action, &database_url).await;
    }

    let ctx = AppContext::open(config, &database_url, cancel).await?;

    let result = match command {
        Commands::Add { url, no_commits } => {
            commands::repo::handle_add(&ctx, &url, !no_commits).await
        }
        Commands::List { output } => commands::repo::handle_list(&ctx, output).await,
        Commands::Commits {
            repo,
            limit,
            output,
        } => commands::commits::handle_commits(&ctx, &repo, limit, output).await,
        Commands::Pull {
            repo,
            since,
            append,
        } => commands::commits::handle_pull(&ctx, &repo, since, append).await,
        Commands::Authors {
            repo,
            limit,
            output,
        } => commands::repo::handle_authors(&ctx, &repo, limit, output).await,
        Commands::Remove { repo, yes } => commands::repo::handle_remove(&ctx, &repo, yes).await,
        Commands::Refresh => commands::refresh::handle_refresh(&ctx).await,
        Commands::Watch {
            interval_hours,
            now,
        } => commands::refresh::handle_watch(&ctx, interval_hours, now).await,
        Commands::Menu => commands::menu::handle_menu(&ctx).await,
        Commands::Migrate { .. } | Commands::Completions { .. } => Ok(()),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
