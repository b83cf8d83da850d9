//! Authority identity: roles and company-scoped permission names.

use serde::{Deserialize, Serialize};

use metergrid_core::CompanyId;

use crate::{catalog::PermissionKind, role::Role};

/// Name of a company-scoped permission.
///
/// A composite of capability kind and company id; each active company owns
/// exactly one permission per catalog kind. The `Display` form is the
/// flattened rendering (`manageUsers5`) used in logs and legacy tooling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionName {
    pub kind: PermissionKind,
    pub company_id: CompanyId,
}

impl PermissionName {
    pub const fn new(kind: PermissionKind, company_id: CompanyId) -> Self {
        Self { kind, company_id }
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.kind.as_str(), self.company_id)
    }
}

/// An authority in the store: a role or a company-scoped permission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    Role(Role),
    Permission(PermissionName),
}

impl From<Role> for Authority {
    fn from(role: Role) -> Self {
        Self::Role(role)
    }
}

impl From<PermissionName> for Authority {
    fn from(name: PermissionName) -> Self {
        Self::Permission(name)
    }
}

impl core::fmt::Display for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Role(role) => f.write_str(role.as_str()),
            Self::Permission(name) => core::fmt::Display::fmt(name, f),
        }
    }
}
