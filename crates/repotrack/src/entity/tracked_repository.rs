//! TrackedRepository entity - one row per repository the user follows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Store-assigned repository id.
pub type RepositoryId = i32;

/// A tracked repository and its point-in-time counters.
///
/// Rows are upserted by `url` on every successful metadata fetch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracked_repositories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Numeric id assigned by GitHub.
    pub platform_id: i64,
    /// Canonical API URL (`https://api.github.com/repos/{owner}/{name}`).
    #[sea_orm(unique)]
    pub url: String,

    // ─── Identity ────────────────────────────────────────────────────────────
    pub name: String,
    pub full_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub language: Option<String>,

    // ─── Counters (overwritten on refresh) ───────────────────────────────────
    pub forks: i32,
    pub stars: i32,
    pub open_issues: i32,
    pub watchers: i32,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    pub created_at: Option<DateTimeWithTimeZone>,
    pub pushed_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// When the metadata was last fetched.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commit::Entity")]
    Commits,
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Browser URL for the repository.
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}", self.full_name)
    }
}
