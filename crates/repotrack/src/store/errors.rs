use sea_orm::DbErr;
use thiserror::Error;

use crate::entity::tracked_repository::RepositoryId;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Record not found.
    #[error("Record not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a repository id lookup.
    pub fn repository_not_found(id: RepositoryId) -> Self {
        Self::NotFound {
            context: format!("repository id={id}"),
        }
    }

    /// Create a NotFound error for a repository URL lookup.
    pub fn repository_url_not_found(url: &str) -> Self {
        Self::NotFound {
            context: format!("repository url={url}"),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
