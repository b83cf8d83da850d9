//! Permission evaluation and mutation.
//!
//! `AccessControl` is the authorization service: it computes a user's
//! permission set within a company (served through the cache) and applies
//! permission-set updates against the authority store with the minimum
//! number of grant/revoke writes. Cache invalidation happens synchronously
//! on every write path, so an in-process read after a successful update
//! never observes a stale set.

use std::sync::Arc;

use tracing::{debug, info};

use metergrid_core::{CompanyId, UserId};

use crate::{
    AccessCache, AccessError, AccessKey, AccessResult, Authority, AuthorityStore, CacheSettings,
    PermissionKind, PermissionName, PermissionSet, Role,
};

/// Read access to a user's current global role.
///
/// Implemented by the record layer and injected here, so the evaluator
/// can apply role-tier exclusions without depending on record storage.
pub trait RoleLookup: Send + Sync {
    /// The user's role, or `None` when the user does not exist.
    fn role_of(&self, user: UserId) -> AccessResult<Option<Role>>;
}

impl<R> RoleLookup for Arc<R>
where
    R: RoleLookup + ?Sized,
{
    fn role_of(&self, user: UserId) -> AccessResult<Option<Role>> {
        (**self).role_of(user)
    }
}

/// Company-scoped authorization service.
pub struct AccessControl {
    store: Arc<dyn AuthorityStore>,
    cache: Arc<dyn AccessCache>,
    roles: Arc<dyn RoleLookup>,
    settings: CacheSettings,
}

impl AccessControl {
    pub fn new(
        store: Arc<dyn AuthorityStore>,
        cache: Arc<dyn AccessCache>,
        roles: Arc<dyn RoleLookup>,
    ) -> Self {
        Self::with_settings(store, cache, roles, CacheSettings::default())
    }

    pub fn with_settings(
        store: Arc<dyn AuthorityStore>,
        cache: Arc<dyn AccessCache>,
        roles: Arc<dyn RoleLookup>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            cache,
            roles,
            settings,
        }
    }

    /// Seed the three global roles and the hierarchy edges.
    ///
    /// Run once at system bootstrap; roles are immutable afterwards, so a
    /// second run fails with `DuplicateAuthority`.
    pub fn bootstrap_roles(&self) -> AccessResult<()> {
        for role in Role::ALL {
            self.store.create_role(role, role.description())?;
        }
        for child in Role::SuperAdmin.children() {
            self.store.add_role_child(Role::SuperAdmin, *child)?;
        }
        info!("seeded global roles");
        Ok(())
    }

    /// A user's permission set within a company.
    ///
    /// Served from the cache when present; otherwise computed per catalog
    /// kind and stored with the configured TTL and tag. Subjects with the
    /// `user` role never see the `manageUsers` kind. A company without
    /// provisioned permissions resolves every kind to `false`.
    pub fn permissions(&self, company: CompanyId, user: UserId) -> AccessResult<PermissionSet> {
        let key = AccessKey::new(company, user);
        if let Some(cached) = self.cache.get(key)? {
            return Ok(cached);
        }

        let plain_user = self.is_role_user(user)?;
        let mut set = PermissionSet::new();
        for kind in PermissionKind::ALL {
            if plain_user && kind == PermissionKind::ManageUsers {
                continue;
            }
            let name = PermissionName::new(kind, company);
            let allowed = self.store.check_access(user, Authority::Permission(name))?;
            set.insert(kind, allowed);
        }

        self.cache.put(key, &set, self.settings.ttl, &self.settings.tag)?;
        Ok(set)
    }

    /// Replace a user's permission set within a company.
    ///
    /// A kind missing from `desired` is revoked; a kind equal to its
    /// current value is skipped entirely; a changed kind is revoked and,
    /// when the desired value is `true`, re-assigned. A `manageUsers`
    /// entry is ignored for subjects with the `user` role. The cache
    /// entry is dropped before returning, so a following read reflects
    /// `desired` exactly.
    pub fn set_permissions(
        &self,
        company: CompanyId,
        user: UserId,
        desired: &PermissionSet,
    ) -> AccessResult<()> {
        let plain_user = self.is_role_user(user)?;
        let current = self.permissions(company, user)?;

        for kind in PermissionKind::ALL {
            if plain_user && kind == PermissionKind::ManageUsers {
                continue;
            }
            let authority = Authority::Permission(PermissionName::new(kind, company));
            match desired.get(&kind) {
                None => self.store.revoke(authority, user)?,
                Some(wanted) if current.get(&kind) == Some(wanted) => {}
                Some(wanted) => {
                    self.store.revoke(authority, user)?;
                    if *wanted {
                        self.store.assign(authority, user)?;
                    }
                }
            }
        }

        self.invalidate_cache(user, &[company])?;
        debug!(company = %company, user = %user, "permission set replaced");
        Ok(())
    }

    /// Revoke every provisioned permission the user holds in the given
    /// companies and drop the matching cache entries.
    ///
    /// A permission that was never provisioned (company deleted or never
    /// created) is skipped silently; revoking a missing assignment is a
    /// no-op, so callers never pre-check.
    pub fn reset_permissions(&self, user: UserId, companies: &[CompanyId]) -> AccessResult<()> {
        for &company in companies {
            for kind in PermissionKind::ALL {
                let name = PermissionName::new(kind, company);
                if self.store.permission(name)?.is_some() {
                    self.store.revoke(Authority::Permission(name), user)?;
                }
            }
            self.cache.delete(AccessKey::new(company, user))?;
        }
        if !companies.is_empty() {
            debug!(user = %user, companies = ?companies, "permissions reset");
        }
        Ok(())
    }

    /// Provision the full permission catalog for a new company.
    pub fn create_company_permissions(&self, company: CompanyId) -> AccessResult<()> {
        for (kind, description) in PermissionKind::catalog() {
            self.store
                .create_permission(PermissionName::new(kind, company), description)?;
        }
        info!(company = %company, "company permission set provisioned");
        Ok(())
    }

    /// Assign a global role to a user.
    ///
    /// Fails with `AuthorityNotFound` when the role was never seeded.
    pub fn assign_role(&self, user: UserId, role: Role) -> AccessResult<()> {
        let record = self
            .store
            .role(role)?
            .ok_or_else(|| AccessError::not_found(role.as_str()))?;
        self.store.assign(Authority::Role(record.role), user)
    }

    /// Drop the user's cache entry in each given company.
    pub fn invalidate_cache(&self, user: UserId, companies: &[CompanyId]) -> AccessResult<()> {
        for &company in companies {
            self.cache.delete(AccessKey::new(company, user))?;
        }
        Ok(())
    }

    /// Evict every cached permission set (catalog-change path).
    pub fn invalidate_all(&self) -> AccessResult<()> {
        self.cache.delete_by_tag(&self.settings.tag)
    }

    fn is_role_user(&self, user: UserId) -> AccessResult<bool> {
        Ok(self.roles.role_of(user)? == Some(Role::User))
    }
}
