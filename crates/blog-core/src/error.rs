//! Error types shared by the domain and its storage ports.

use thiserror::Error;

/// A rule of the blog domain was broken.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} with id {id} not found")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Storage failures, as seen through the repository ports.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Any other integrity violation, e.g. a dangling foreign key.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}
