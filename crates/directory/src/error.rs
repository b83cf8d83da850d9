//! Record-layer error model.

use thiserror::Error;

use metergrid_access::AccessError;
use metergrid_core::DomainError;

/// Result type used across the record layer.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Record-layer error: domain failures from validation, access-layer
/// failures surfaced by post-commit hooks, or record-store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Access(#[from] AccessError),

    /// The record store failed.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
