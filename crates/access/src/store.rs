//! Authority persistence boundary.
//!
//! Wraps role/permission records, the role hierarchy and subject
//! assignments behind a trait so the service layer stays storage-agnostic.
//! An in-memory adapter covers tests, dev and single-process deployments;
//! a SQL adapter can implement the same trait.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use metergrid_core::UserId;

use crate::{AccessError, AccessResult, Authority, PermissionName, Role};

/// A persisted role with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub role: Role,
    pub description: String,
}

/// A persisted company-scoped permission with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub name: PermissionName,
    pub description: String,
}

/// Authority persistence boundary (roles, permissions, assignments).
///
/// Contract notes:
/// - `assign` is NOT idempotent: assigning an authority that is already
///   assigned fails. Callers toggling a permission revoke first.
/// - `revoke` IS idempotent: revoking a missing assignment (or an unknown
///   authority) succeeds and changes nothing.
/// - `check_access` resolves the role hierarchy downward from the
///   subject's assigned roles; permission targets match direct
///   assignments only, and unknown targets resolve `false`.
pub trait AuthorityStore: Send + Sync {
    fn create_role(&self, role: Role, description: &str) -> AccessResult<()>;

    /// Persist a hierarchy edge. Both roles must already exist; an
    /// existing edge is left as-is.
    fn add_role_child(&self, parent: Role, child: Role) -> AccessResult<()>;

    fn create_permission(&self, name: PermissionName, description: &str) -> AccessResult<()>;

    fn role(&self, role: Role) -> AccessResult<Option<RoleRecord>>;

    fn permission(&self, name: PermissionName) -> AccessResult<Option<PermissionRecord>>;

    fn assign(&self, authority: Authority, subject: UserId) -> AccessResult<()>;

    fn revoke(&self, authority: Authority, subject: UserId) -> AccessResult<()>;

    fn check_access(&self, subject: UserId, target: Authority) -> AccessResult<bool>;

    /// Every authority currently assigned to the subject (unordered).
    fn assignments(&self, subject: UserId) -> AccessResult<Vec<Authority>>;

    /// Wipe all authority data (roles, permissions, edges, assignments).
    fn remove_all(&self) -> AccessResult<()>;
}

impl<S> AuthorityStore for Arc<S>
where
    S: AuthorityStore + ?Sized,
{
    fn create_role(&self, role: Role, description: &str) -> AccessResult<()> {
        (**self).create_role(role, description)
    }

    fn add_role_child(&self, parent: Role, child: Role) -> AccessResult<()> {
        (**self).add_role_child(parent, child)
    }

    fn create_permission(&self, name: PermissionName, description: &str) -> AccessResult<()> {
        (**self).create_permission(name, description)
    }

    fn role(&self, role: Role) -> AccessResult<Option<RoleRecord>> {
        (**self).role(role)
    }

    fn permission(&self, name: PermissionName) -> AccessResult<Option<PermissionRecord>> {
        (**self).permission(name)
    }

    fn assign(&self, authority: Authority, subject: UserId) -> AccessResult<()> {
        (**self).assign(authority, subject)
    }

    fn revoke(&self, authority: Authority, subject: UserId) -> AccessResult<()> {
        (**self).revoke(authority, subject)
    }

    fn check_access(&self, subject: UserId, target: Authority) -> AccessResult<bool> {
        (**self).check_access(subject, target)
    }

    fn assignments(&self, subject: UserId) -> AccessResult<Vec<Authority>> {
        (**self).assignments(subject)
    }

    fn remove_all(&self) -> AccessResult<()> {
        (**self).remove_all()
    }
}

#[derive(Debug, Default)]
struct Inner {
    roles: HashMap<Role, RoleRecord>,
    role_children: HashMap<Role, HashSet<Role>>,
    permissions: HashMap<PermissionName, PermissionRecord>,
    assignments: HashMap<UserId, HashSet<Authority>>,
}

impl Inner {
    fn authority_exists(&self, authority: Authority) -> bool {
        match authority {
            Authority::Role(role) => self.roles.contains_key(&role),
            Authority::Permission(name) => self.permissions.contains_key(&name),
        }
    }
}

/// In-memory authority store.
///
/// Not optimized for large assignment sets; fine for tests and
/// single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryAuthorityStore {
    inner: RwLock<Inner>,
}

impl InMemoryAuthorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AccessResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| AccessError::StoreUnavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> AccessResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| AccessError::StoreUnavailable("lock poisoned".to_string()))
    }
}

impl AuthorityStore for InMemoryAuthorityStore {
    fn create_role(&self, role: Role, description: &str) -> AccessResult<()> {
        let mut inner = self.write()?;
        if inner.roles.contains_key(&role) {
            return Err(AccessError::duplicate(role.as_str()));
        }
        inner.roles.insert(
            role,
            RoleRecord {
                role,
                description: description.to_string(),
            },
        );
        Ok(())
    }

    fn add_role_child(&self, parent: Role, child: Role) -> AccessResult<()> {
        let mut inner = self.write()?;
        if !inner.roles.contains_key(&parent) {
            return Err(AccessError::not_found(parent.as_str()));
        }
        if !inner.roles.contains_key(&child) {
            return Err(AccessError::not_found(child.as_str()));
        }
        inner.role_children.entry(parent).or_default().insert(child);
        Ok(())
    }

    fn create_permission(&self, name: PermissionName, description: &str) -> AccessResult<()> {
        let mut inner = self.write()?;
        if inner.permissions.contains_key(&name) {
            return Err(AccessError::duplicate(name.to_string()));
        }
        inner.permissions.insert(
            name,
            PermissionRecord {
                name,
                description: description.to_string(),
            },
        );
        Ok(())
    }

    fn role(&self, role: Role) -> AccessResult<Option<RoleRecord>> {
        Ok(self.read()?.roles.get(&role).cloned())
    }

    fn permission(&self, name: PermissionName) -> AccessResult<Option<PermissionRecord>> {
        Ok(self.read()?.permissions.get(&name).cloned())
    }

    fn assign(&self, authority: Authority, subject: UserId) -> AccessResult<()> {
        let mut inner = self.write()?;
        if !inner.authority_exists(authority) {
            return Err(AccessError::not_found(authority.to_string()));
        }
        let granted = inner.assignments.entry(subject).or_default().insert(authority);
        if !granted {
            return Err(AccessError::DuplicateAssignment {
                authority: authority.to_string(),
                subject,
            });
        }
        debug!(authority = %authority, subject = %subject, "authority assigned");
        Ok(())
    }

    fn revoke(&self, authority: Authority, subject: UserId) -> AccessResult<()> {
        let mut inner = self.write()?;
        if let Some(assigned) = inner.assignments.get_mut(&subject) {
            if assigned.remove(&authority) {
                debug!(authority = %authority, subject = %subject, "authority revoked");
            }
            if assigned.is_empty() {
                inner.assignments.remove(&subject);
            }
        }
        Ok(())
    }

    fn check_access(&self, subject: UserId, target: Authority) -> AccessResult<bool> {
        let inner = self.read()?;
        let Some(assigned) = inner.assignments.get(&subject) else {
            return Ok(false);
        };
        if assigned.contains(&target) {
            return Ok(true);
        }

        // Role targets may be reachable through the persisted hierarchy;
        // permission targets never are (permissions have no children).
        if let Authority::Role(wanted) = target {
            let mut queue: Vec<Role> = assigned
                .iter()
                .filter_map(|authority| match authority {
                    Authority::Role(role) => Some(*role),
                    Authority::Permission(_) => None,
                })
                .collect();
            let mut seen: HashSet<Role> = queue.iter().copied().collect();
            while let Some(role) = queue.pop() {
                if role == wanted {
                    return Ok(true);
                }
                for child in inner.role_children.get(&role).into_iter().flatten() {
                    if seen.insert(*child) {
                        queue.push(*child);
                    }
                }
            }
        }

        Ok(false)
    }

    fn assignments(&self, subject: UserId) -> AccessResult<Vec<Authority>> {
        Ok(self
            .read()?
            .assignments
            .get(&subject)
            .map(|assigned| assigned.iter().copied().collect())
            .unwrap_or_default())
    }

    fn remove_all(&self) -> AccessResult<()> {
        *self.write()? = Inner::default();
        Ok(())
    }
}
