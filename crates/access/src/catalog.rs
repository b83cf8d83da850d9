//! Fixed catalog of permission kinds.
//!
//! Eleven capability kinds, defined once and never created or deleted at
//! runtime. Every company owns one permission per kind. Iteration follows
//! catalog order wherever permission sets are computed or updated.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use metergrid_core::DomainError;

/// A capability kind from the static permission catalog.
///
/// Serialized names are the camelCase identifiers the REST layer exposes
/// (`manageUsers`, `viewDevices`, ...).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PermissionKind {
    ManageUsers,
    ViewDevices,
    ManageDevices,
    ViewEquipments,
    ManageEquipments,
    ManagePlacements,
    ManageLines,
    ManageExtFactors,
    EnterMetrics,
    ManageTariffs,
    ViewEconomic,
}

impl PermissionKind {
    /// All kinds, in catalog order.
    pub const ALL: [Self; 11] = [
        Self::ManageUsers,
        Self::ViewDevices,
        Self::ManageDevices,
        Self::ViewEquipments,
        Self::ManageEquipments,
        Self::ManagePlacements,
        Self::ManageLines,
        Self::ManageExtFactors,
        Self::EnterMetrics,
        Self::ManageTariffs,
        Self::ViewEconomic,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "manageUsers",
            Self::ViewDevices => "viewDevices",
            Self::ManageDevices => "manageDevices",
            Self::ViewEquipments => "viewEquipments",
            Self::ManageEquipments => "manageEquipments",
            Self::ManagePlacements => "managePlacements",
            Self::ManageLines => "manageLines",
            Self::ManageExtFactors => "manageExtFactors",
            Self::EnterMetrics => "enterMetrics",
            Self::ManageTariffs => "manageTariffs",
            Self::ViewEconomic => "viewEconomic",
        }
    }

    /// Human-readable description shown in authorization views.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ManageUsers => "Manage users",
            Self::ViewDevices => "View metering devices",
            Self::ManageDevices => "Manage metering devices",
            Self::ViewEquipments => "View equipment",
            Self::ManageEquipments => "Manage equipment",
            Self::ManagePlacements => "Manage placements",
            Self::ManageLines => "Manage lines",
            Self::ManageExtFactors => "Manage external factors",
            Self::EnterMetrics => "Enter meter readings",
            Self::ManageTariffs => "Manage tariffs",
            Self::ViewEconomic => "View economic indicators",
        }
    }

    /// The catalog as an ordered sequence of `(kind, description)` pairs.
    pub fn catalog() -> impl Iterator<Item = (Self, &'static str)> {
        Self::ALL.into_iter().map(|kind| (kind, kind.description()))
    }
}

impl core::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::validation(format!("unknown permission kind: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_eleven_ordered_kinds() {
        assert_eq!(PermissionKind::ALL.len(), 11);
        assert_eq!(PermissionKind::ALL[0], PermissionKind::ManageUsers);
        assert_eq!(PermissionKind::ALL[10], PermissionKind::ViewEconomic);

        let entries: Vec<_> = PermissionKind::catalog().collect();
        assert_eq!(entries.len(), 11);
        assert_eq!(entries[1], (PermissionKind::ViewDevices, "View metering devices"));
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_string(&PermissionKind::ManageExtFactors).unwrap();
        assert_eq!(json, "\"manageExtFactors\"");

        let kind: PermissionKind = serde_json::from_str("\"enterMetrics\"").unwrap();
        assert_eq!(kind, PermissionKind::EnterMetrics);
    }

    #[test]
    fn parse_matches_wire_names() {
        for kind in PermissionKind::ALL {
            assert_eq!(kind.as_str().parse::<PermissionKind>().unwrap(), kind);
        }
        assert!("manage_users".parse::<PermissionKind>().is_err());
    }

    #[test]
    fn descriptions_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for (_, description) in PermissionKind::catalog() {
            assert!(seen.insert(description), "duplicate description: {description}");
        }
    }
}
