//! Initial migration: tracked repositories and their commits.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_tracked_repositories(manager).await?;
        self.create_commits(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Commits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TrackedRepositories::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_tracked_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrackedRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrackedRepositories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::PlatformId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::Url)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    // Identity
                    .col(ColumnDef::new(TrackedRepositories::Name).string().not_null())
                    .col(
                        ColumnDef::new(TrackedRepositories::FullName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackedRepositories::Description).text().null())
                    .col(ColumnDef::new(TrackedRepositories::Language).string().null())
                    // Counters
                    .col(
                        ColumnDef::new(TrackedRepositories::Forks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::Stars)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::OpenIssues)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::Watchers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(TrackedRepositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::PushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrackedRepositories::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_commits(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Commits::Sha)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Commits::Message).text().not_null())
                    .col(ColumnDef::new(Commits::Url).string().not_null())
                    .col(ColumnDef::new(Commits::AuthorName).string().not_null())
                    .col(ColumnDef::new(Commits::AuthorEmail).string().not_null())
                    .col(
                        ColumnDef::new(Commits::AuthoredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Commits::RepositoryId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commits_repository")
                            .from(Commits::Table, Commits::RepositoryId)
                            .to(TrackedRepositories::Table, TrackedRepositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Cursor lookups and per-repository listings order by authorship time.
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_repository_authored_at")
                    .table(Commits::Table)
                    .col(Commits::RepositoryId)
                    .col(Commits::AuthoredAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum TrackedRepositories {
    Table,
    Id,
    PlatformId,
    Url,
    Name,
    FullName,
    Description,
    Language,
    Forks,
    Stars,
    OpenIssues,
    Watchers,
    CreatedAt,
    PushedAt,
    UpdatedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum Commits {
    Table,
    Sha,
    Message,
    Url,
    AuthorName,
    AuthorEmail,
    AuthoredAt,
    RepositoryId,
}
