//! Common re-exports for convenient entity usage.

pub use super::commit::{
    ActiveModel as CommitActiveModel, Column as CommitColumn, Entity as Commit,
    Model as CommitRecord,
};
pub use super::tracked_repository::{
    ActiveModel as TrackedRepositoryActiveModel, Column as TrackedRepositoryColumn,
    Entity as TrackedRepository, Model as RepositoryRef, RepositoryId,
};
