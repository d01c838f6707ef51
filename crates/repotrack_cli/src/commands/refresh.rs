use std::sync::Arc;
use std::time::Duration;

use repotrack::{RefreshScheduler, RefreshSummary};

use crate::commands::shared::{AppContext, CliResult};
use crate::progress::ProgressReporter;

fn report(summary: &RefreshSummary) {
    println!(
        "Refreshed {} of {} repositories ({} new commits).",
        summary.refreshed, summary.repositories, summary.inserted
    );
    for (repo, error) in &summary.errors {
        eprintln!("  {repo}: {error}");
    }
}

/// Run a single refresh pass over every tracked repository.
pub(crate) async fn handle_refresh(ctx: &AppContext) -> CliResult {
    let reporter = Arc::new(ProgressReporter::new());
    let tracker = ctx.tracker(&reporter)?;

    let summary = tracker.refresh_all_tracked().await;
    reporter.finish();
    report(&summary);

    if summary.failed > 0 {
        return Err(format!("{} repositories failed to refresh", summary.failed).into());
    }
    Ok(())
}

/// Refresh on an interval until Ctrl+C.
pub(crate) async fn handle_watch(
    ctx: &AppContext,
    interval_hours: Option<u64>,
    now: bool,
) -> CliResult {
    let interval = match interval_hours {
        Some(hours) if hours > 0 => Duration::from_secs(hours * 60 * 60),
        _ => ctx.config.refresh_interval(),
    };

    let reporter = Arc::new(ProgressReporter::new());
    let tracker = Arc::new(ctx.tracker(&reporter)?);

    println!(
        "Refreshing tracked repositories every {} hour(s). Press Ctrl+C to stop.",
        interval.as_secs() / 3600
    );
    tracing::info!(interval_secs = interval.as_secs(), run_now = now, "Starting scheduler");

    let passes = RefreshScheduler::new(tracker, ctx.cancel.clone())
        .with_interval(interval)
        .run_immediately(now)
        .run()
        .await;
    reporter.finish();

    println!("Stopped after {passes} refresh pass(es).");
    Ok(())
}
