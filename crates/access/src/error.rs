//! Authorization error model.

use thiserror::Error;

use metergrid_core::UserId;

/// Result type used across the authorization layer.
pub type AccessResult<T> = Result<T, AccessError>;

/// Authorization-layer error.
///
/// Store and cache failures are surfaced synchronously to the immediate
/// caller; this layer performs no retries. The one deliberate swallow is
/// a permission lookup that comes back empty during a reset — revoking an
/// assignment that does not exist is a valid request, not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// A referenced role or permission does not exist in the store.
    #[error("authority not found: {name}")]
    AuthorityNotFound { name: String },

    /// A role or permission with this name already exists.
    #[error("duplicate authority: {name}")]
    DuplicateAuthority { name: String },

    /// The authority is already assigned to the subject.
    #[error("authority '{authority}' is already assigned to subject {subject}")]
    DuplicateAssignment { authority: String, subject: UserId },

    /// The cache backend failed.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// The authority store failed.
    #[error("authority store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AccessError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::AuthorityNotFound { name: name.into() }
    }

    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateAuthority { name: name.into() }
    }
}
