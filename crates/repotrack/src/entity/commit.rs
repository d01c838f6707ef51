//! Commit entity - immutable commit history rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One historical commit of a tracked repository.
///
/// Rows are only ever inserted-if-absent (keyed by `sha`) or deleted together
/// with the rest of a repository's history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub sha: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub url: String,
    pub author_name: String,
    pub author_email: String,
    /// Authorship timestamp, stored in UTC.
    pub authored_at: DateTimeWithTimeZone,
    pub repository_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tracked_repository::Entity",
        from = "Column::RepositoryId",
        to = "super::tracked_repository::Column::Id",
        on_delete = "Cascade"
    )]
    TrackedRepository,
}

impl Related<super::tracked_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackedRepository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Abbreviated SHA as shown by `git log --oneline`.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}
