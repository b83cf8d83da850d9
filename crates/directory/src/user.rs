//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metergrid_access::Role;
use metergrid_core::{CompanyId, DomainError, UserId};

pub(crate) const MAX_EMAIL_LEN: usize = 50;
pub(crate) const MAX_NAME_LEN: usize = 50;

/// A platform user account.
///
/// `role` is the single global role of the subject; `companies` is the
/// sorted list of companies the user belongs to. Subjects with the `user`
/// role belong to at most one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub enabled: bool,
    pub role: Role,
    pub companies: Vec<CompanyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user.
///
/// `superAdmin` is seeded at bootstrap and never created through this
/// path; the creation role is restricted to `admin`/`user`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub companies: Vec<CompanyId>,
}

/// Partial update of a user record. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub role: Option<Role>,
    pub companies: Option<Vec<CompanyId>>,
}

/// Validate and canonicalize an email (trimmed, lowercased).
pub(crate) fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(DomainError::validation("email too long"));
    }
    Ok(email)
}

pub(crate) fn normalize_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation("name too long"));
    }
    Ok(name.to_string())
}

/// Canonical company list for a role: de-duplicated (first occurrence
/// wins), truncated to the first company for `user`-role subjects, then
/// sorted ascending.
pub fn normalize_companies(role: Role, companies: &[CompanyId]) -> Vec<CompanyId> {
    let mut unique: Vec<CompanyId> = Vec::with_capacity(companies.len());
    for &company in companies {
        if !unique.contains(&company) {
            unique.push(company);
        }
    }
    if role == Role::User && unique.len() > 1 {
        unique.truncate(1);
    }
    unique.sort();
    unique
}
