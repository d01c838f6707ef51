//! Fetch-and-reconcile pipeline and the refresh scheduler.
//!
//! - [`types`] - `ReconcilePolicy`, `CommitSyncResult`, `RefreshSummary`
//! - [`progress`] - `SyncProgress` events and the `emit()` helper
//! - [`engine`] - `Tracker`, the pipeline entry points
//! - [`scheduler`] - `RefreshScheduler`
//!
//! ```ignore
//! use repotrack::sync::{RefreshScheduler, Tracker};
//!
//! let tracker = Arc::new(Tracker::new(client, store));
//! let handle = RefreshScheduler::new(tracker, cancel.clone()).spawn();
//! ```

pub mod engine;
mod progress;
pub mod scheduler;
mod types;

pub use engine::Tracker;
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use scheduler::RefreshScheduler;
pub use types::{CommitSyncResult, DEFAULT_REFRESH_INTERVAL, ReconcilePolicy, RefreshSummary};
