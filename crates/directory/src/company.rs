//! Company records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metergrid_core::{CompanyId, DomainError};

pub(crate) const MAX_TITLE_LEN: usize = 100;

/// A company (organization) record.
///
/// Deactivating a company never deletes its permission set; the company
/// simply stops being reachable from the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub title: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub title: String,
}

/// Partial update of a company record. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub title: Option<String>,
    pub enabled: Option<bool>,
}

pub(crate) fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(DomainError::validation("title too long"));
    }
    Ok(title.to_string())
}
