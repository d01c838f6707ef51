//! repotrack - fetch, persist and refresh GitHub repository history.
//!
//! The library walks the GitHub REST API (following `link` pagination and
//! waiting out rate limits), normalizes repository metadata and commits into
//! flat records, and reconciles them against a relational store.
//!
//! # Features
//!
//! - `sqlite` / `postgres` - database backends for the sea-orm store.
//! - `migrate` - enables [`ensure_schema`] and [`connect_and_migrate`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use repotrack::{DbStore, GitHubClient, Tracker, connect_and_migrate};
//!
//! let db = connect_and_migrate("sqlite://repotrack.db?mode=rwc").await?;
//! let tracker = Tracker::new(GitHubClient::new(None)?, Arc::new(DbStore::new(db)));
//!
//! let repo = tracker.fetch_repository("https://github.com/rust-lang/log").await?;
//! let commits = tracker.fetch_commits(&repo.url, None).await?;
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod http;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::{connect_and_migrate, ensure_schema};
pub use entity::prelude::*;
pub use github::{FetchError, GitHubClient, sanitize_repo_url};
pub use store::{AuthorStats, DbStore, RecordStore, StoreError};
pub use sync::{
    CommitSyncResult, ReconcilePolicy, RefreshScheduler, RefreshSummary, SyncProgress, Tracker,
};
