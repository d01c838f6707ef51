use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, OnConflict},
};

use crate::entity::commit::{Column, Entity as Commit, Model};
use crate::entity::tracked_repository::RepositoryId;

use super::errors::{Result, StoreError};
use super::records::{AuthorStats, InsertOutcome, NewCommit};

/// Insert a commit unless one with the same SHA already exists.
pub async fn insert_if_absent(db: &DatabaseConnection, commit: &NewCommit) -> Result<InsertOutcome> {
    let result = Commit::insert(commit.to_active_model())
        .on_conflict(OnConflict::column(Column::Sha).do_nothing().to_owned())
        .exec_without_returning(db)
        .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => Ok(InsertOutcome::AlreadyPresent),
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(e) => Err(StoreError::from(e)),
    }
}

/// Delete every commit owned by a repository.
///
/// Returns the number of rows deleted.
pub async fn delete_for_repository(db: &DatabaseConnection, repository_id: RepositoryId) -> Result<u64> {
    let result = Commit::delete_many()
        .filter(Column::RepositoryId.eq(repository_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// All commits of a repository, newest first.
pub async fn find_for_repository(
    db: &DatabaseConnection,
    repository_id: RepositoryId,
) -> Result<Vec<Model>> {
    Commit::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .order_by_desc(Column::AuthoredAt)
        .order_by_asc(Column::Sha)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// The most recently authored commit of a repository (the refresh cursor).
pub async fn find_latest(db: &DatabaseConnection, repository_id: RepositoryId) -> Result<Option<Model>> {
    Commit::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .order_by_desc(Column::AuthoredAt)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Authors ranked by number of commits, most active first.
///
/// A `limit` of 0 returns every author. Ties are ordered by name.
pub async fn top_authors(
    db: &DatabaseConnection,
    repository_id: RepositoryId,
    limit: u64,
) -> Result<Vec<AuthorStats>> {
    let commit_count = Expr::col(Column::Sha).count();

    let mut query = Commit::find()
        .select_only()
        .column_as(Column::AuthorName, "name")
        .column_as(Column::AuthorEmail, "email")
        .column_as(commit_count.clone(), "commits")
        .filter(Column::RepositoryId.eq(repository_id))
        .group_by(Column::AuthorName)
        .group_by(Column::AuthorEmail)
        .order_by_desc(commit_count)
        .order_by_asc(Column::AuthorName);

    if limit > 0 {
        query = query.limit(limit);
    }

    query
        .into_model::<AuthorStats>()
        .all(db)
        .await
        .map_err(StoreError::from)
}
