//! Global roles and their hierarchy.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use metergrid_core::DomainError;

/// Global role of a user.
///
/// The hierarchy is fixed: `superAdmin` inherits the `admin` and `user`
/// roles; `admin` and `user` are disjoint. Inheritance is role-to-role
/// only — company-scoped permissions are never inherited through the
/// hierarchy and must be assigned explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::SuperAdmin, Self::Admin, Self::User];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "superAdmin",
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Head administrator",
            Self::Admin => "Administrator",
            Self::User => "Regular user",
        }
    }

    /// Direct children in the role hierarchy.
    pub const fn children(&self) -> &'static [Role] {
        match self {
            Self::SuperAdmin => &[Self::Admin, Self::User],
            Self::Admin | Self::User => &[],
        }
    }

    /// Role-to-role inheritance (reflexive).
    pub fn implies(&self, other: Role) -> bool {
        *self == other || self.children().contains(&other)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|role| role.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::validation(format!("unknown role: {s}")))
    }
}
