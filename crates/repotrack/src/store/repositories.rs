use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entity::tracked_repository::{
    ActiveModel, Column, Entity as TrackedRepository, Model, RepositoryId,
};

use super::errors::{Result, StoreError};
use super::records::NewRepository;

/// Find a repository by its canonical API URL.
pub async fn find_by_url(db: &DatabaseConnection, url: &str) -> Result<Option<Model>> {
    TrackedRepository::find()
        .filter(Column::Url.eq(url))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Find a repository by its store id.
pub async fn find_by_id(db: &DatabaseConnection, id: RepositoryId) -> Result<Option<Model>> {
    TrackedRepository::find_by_id(id)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// List every tracked repository, ordered by id (insertion order).
pub async fn list(db: &DatabaseConnection) -> Result<Vec<Model>> {
    TrackedRepository::find()
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Insert or update a repository keyed by URL.
///
/// Counters, language and timestamps are overwritten. `name` and
/// `description` keep their stored value when one is already set.
pub async fn upsert(db: &DatabaseConnection, repo: NewRepository) -> Result<Model> {
    if repo.url.is_empty() {
        return Err(StoreError::InvalidInput {
            message: "Missing required field: url".to_string(),
        });
    }

    let synced_at = Utc::now().fixed_offset();

    match find_by_url(db, &repo.url).await? {
        Some(existing) => {
            let keep_name = !existing.name.is_empty();
            let keep_description = existing.description.is_some();

            let mut model: ActiveModel = existing.into();
            if !keep_name {
                model.name = Set(repo.name);
            }
            if !keep_description {
                model.description = Set(repo.description);
            }
            model.platform_id = Set(repo.platform_id);
            model.full_name = Set(repo.full_name);
            model.language = Set(repo.language);
            model.forks = Set(repo.forks);
            model.stars = Set(repo.stars);
            model.open_issues = Set(repo.open_issues);
            model.watchers = Set(repo.watchers);
            model.created_at = Set(repo.created_at.map(|t| t.fixed_offset()));
            model.pushed_at = Set(repo.pushed_at.map(|t| t.fixed_offset()));
            model.updated_at = Set(repo.updated_at.map(|t| t.fixed_offset()));
            model.synced_at = Set(synced_at);
            model.update(db).await.map_err(StoreError::from)
        }
        None => {
            let model = ActiveModel {
                id: ActiveValue::NotSet,
                platform_id: Set(repo.platform_id),
                url: Set(repo.url),
                name: Set(repo.name),
                full_name: Set(repo.full_name),
                description: Set(repo.description),
                language: Set(repo.language),
                forks: Set(repo.forks),
                stars: Set(repo.stars),
                open_issues: Set(repo.open_issues),
                watchers: Set(repo.watchers),
                created_at: Set(repo.created_at.map(|t| t.fixed_offset())),
                pushed_at: Set(repo.pushed_at.map(|t| t.fixed_offset())),
                updated_at: Set(repo.updated_at.map(|t| t.fixed_offset())),
                synced_at: Set(synced_at),
            };
            model.insert(db).await.map_err(StoreError::from)
        }
    }
}

/// Stop tracking a repository. Its commits are removed by the cascading
/// foreign key.
///
/// Returns the number of rows deleted (0 or 1).
pub async fn delete(db: &DatabaseConnection, id: RepositoryId) -> Result<u64> {
    let result = TrackedRepository::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}
