use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use repotrack::SyncProgress;

const TICK: Duration = Duration::from_millis(100);
const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

struct FetchState {
    bar: ProgressBar,
    fetched: usize,
    inserted: usize,
}

#[derive(Default)]
struct ProgressState {
    /// Commit walks by repository full name.
    fetch_bars: HashMap<String, FetchState>,
    /// Bar counting repositories during a refresh pass.
    refresh_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            state: Mutex::new(ProgressState::default()),
        }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(
            indicatif::ProgressDrawTarget::hidden(),
        ))
    }

    fn spinner(&self, prefix: &str) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::spinner_style());
        bar.set_prefix(prefix.to_string());
        bar.enable_steady_tick(TICK);
        bar
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::FetchingRepository { url } => {
                let _ = self.multi.println(format!("Fetching {url}"));
            }

            SyncProgress::MetadataFailed { repository, error } => {
                let _ = self.multi.println(format!(
                    "{repository}: metadata refresh failed ({error}), pulling commits anyway"
                ));
            }

            SyncProgress::RepositorySynced {
                full_name,
                stars,
                forks,
            } => {
                let _ = self
                    .multi
                    .println(format!("{full_name}: {stars} stars, {forks} forks"));
            }

            SyncProgress::FetchingCommits {
                repository,
                since,
                policy,
            } => {
                let bar = self.spinner(&repository);
                bar.set_message(match since {
                    Some(since) => format!("Fetching commits since {since} ({policy})"),
                    None => format!("Fetching commits ({policy})"),
                });
                if let Some(old) = state.fetch_bars.insert(
                    repository,
                    FetchState {
                        bar,
                        fetched: 0,
                        inserted: 0,
                    },
                ) {
                    old.bar.finish_and_clear();
                }
            }

            SyncProgress::ClearedCommits {
                repository,
                deleted,
            } => {
                if let Some(fetch) = state.fetch_bars.get(&repository) {
                    fetch
                        .bar
                        .set_message(format!("Cleared {deleted} stored commits"));
                }
            }

            SyncProgress::FetchedPage {
                repository,
                page,
                count,
                inserted,
                expected_pages,
            } => {
                if let Some(fetch) = state.fetch_bars.get_mut(&repository) {
                    fetch.fetched += count;
                    fetch.inserted += inserted;

                    // Switch from spinner to bar once the page count is known.
                    if let Some(total) = expected_pages
                        && fetch.bar.length().is_none()
                    {
                        fetch.bar.set_length(u64::from(total));
                        fetch.bar.set_style(Self::bar_style());
                    }
                    fetch.bar.set_position(u64::from(page));
                    fetch.bar.set_message(format!(
                        "{} commits, {} new",
                        fetch.fetched, fetch.inserted
                    ));
                }
            }

            SyncProgress::RateLimited {
                url: _,
                status,
                resume_at,
            } => {
                let msg = format!(
                    "Rate limited ({status}), resuming at {}",
                    resume_at.format("%H:%M:%S UTC")
                );
                for fetch in state.fetch_bars.values() {
                    if !fetch.bar.is_finished() {
                        fetch.bar.set_message(msg.clone());
                    }
                }
                let _ = self.multi.println(msg);
            }

            SyncProgress::CommitPersistError { sha, error } => {
                let _ = self
                    .multi
                    .println(format!("Failed to store commit {sha}: {error}"));
            }

            SyncProgress::FetchComplete {
                repository,
                pages,
                fetched,
                inserted,
                skipped,
                failed,
            } => {
                if let Some(fetch) = state.fetch_bars.get(&repository) {
                    fetch.bar.set_style(Self::done_style());
                    let mut msg = format!(
                        "{fetched} commits in {pages} pages: {inserted} new, {skipped} already stored"
                    );
                    if failed > 0 {
                        msg.push_str(&format!(", {failed} failed"));
                    }
                    fetch.bar.finish_with_message(msg);
                }
                if let Some(ref bar) = state.refresh_bar {
                    bar.inc(1);
                }
            }

            SyncProgress::RefreshStarted { repositories } => {
                let bar = self
                    .multi
                    .add(ProgressBar::new(repositories as u64));
                bar.set_style(Self::bar_style());
                bar.set_prefix("refresh");
                bar.set_message("Refreshing tracked repositories");
                if let Some(old) = state.refresh_bar.replace(bar) {
                    old.finish_and_clear();
                }
            }

            SyncProgress::RefreshFailed { repository, error } => {
                if let Some(fetch) = state.fetch_bars.get(&repository)
                    && !fetch.bar.is_finished()
                {
                    fetch.bar.abandon_with_message(format!("Failed: {error}"));
                } else {
                    let _ = self
                        .multi
                        .println(format!("{repository}: refresh failed: {error}"));
                }
                if let Some(ref bar) = state.refresh_bar {
                    bar.inc(1);
                }
            }

            SyncProgress::RefreshComplete { refreshed, failed } => {
                if let Some(bar) = state.refresh_bar.take() {
                    bar.finish_with_message(format!("{refreshed} refreshed, {failed} failed"));
                }
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for fetch in state.fetch_bars.values() {
            if !fetch.bar.is_finished() {
                fetch.bar.finish();
            }
        }
        if let Some(ref bar) = state.refresh_bar
            && !bar.is_finished()
        {
            bar.finish();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS)
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    fn done_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {msg:.green}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
