//! Post-commit reactions to user and company record changes.
//!
//! The record layer invokes these after a committed mutation: a new user
//! receives its global role, a new company receives its permission set,
//! and a changed user has stale permissions cleared and cache entries
//! evicted. Errors propagate to the caller of the mutation; there is no
//! automatic rollback of the record write.

use std::collections::BTreeSet;
use std::sync::Arc;

use metergrid_core::{CompanyId, UserId};

use crate::{AccessControl, AccessResult, Role};

/// A committed change to a user's role or company list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub role_changed: bool,
    pub old_companies: Vec<CompanyId>,
    pub new_companies: Vec<CompanyId>,
}

impl UserUpdate {
    /// Companies whose permissions must be cleared.
    ///
    /// A role change clears every company the user could previously or can
    /// now reach (union of old and new). A company-list change alone
    /// clears only the removed companies: newly added ones carry no
    /// assignments yet and evaluate all-`false` untouched.
    pub fn companies_to_reset(&self) -> Vec<CompanyId> {
        let old: BTreeSet<CompanyId> = self.old_companies.iter().copied().collect();
        let new: BTreeSet<CompanyId> = self.new_companies.iter().copied().collect();
        let picked: BTreeSet<CompanyId> = if self.role_changed {
            old.union(&new).copied().collect()
        } else {
            old.difference(&new).copied().collect()
        };
        picked.into_iter().collect()
    }
}

/// Post-commit hook surface of the access layer.
pub struct AccessHooks {
    access: Arc<AccessControl>,
}

impl AccessHooks {
    pub fn new(access: Arc<AccessControl>) -> Self {
        Self { access }
    }

    /// A user record was inserted: bind its global role.
    pub fn on_user_created(&self, user: UserId, role: Role) -> AccessResult<()> {
        self.access.assign_role(user, role)
    }

    /// A company record was inserted: provision its permission catalog.
    pub fn on_company_created(&self, company: CompanyId) -> AccessResult<()> {
        self.access.create_company_permissions(company)
    }

    /// A user record was updated with a role or company-list change.
    pub fn on_user_updated(&self, user: UserId, update: &UserUpdate) -> AccessResult<()> {
        let to_reset = update.companies_to_reset();
        if !to_reset.is_empty() {
            self.access.reset_permissions(user, &to_reset)?;
        }
        // Entries for the new list may predate the change (the role tier
        // shapes the cached set), so they are evicted as well.
        self.access.invalidate_cache(user, &update.new_companies)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::*;
    use crate::{
        AccessResult, Authority, AuthorityStore, InMemoryAccessCache, InMemoryAuthorityStore,
        PermissionKind, PermissionName, PermissionSet, RoleLookup,
    };

    fn company(id: i64) -> CompanyId {
        CompanyId::new(id)
    }

    #[derive(Default)]
    struct StaticRoles {
        roles: RwLock<HashMap<UserId, Role>>,
    }

    impl StaticRoles {
        fn set(&self, user: UserId, role: Role) {
            self.roles.write().unwrap().insert(user, role);
        }
    }

    impl RoleLookup for StaticRoles {
        fn role_of(&self, user: UserId) -> AccessResult<Option<Role>> {
            Ok(self.roles.read().unwrap().get(&user).copied())
        }
    }

    struct Harness {
        store: Arc<InMemoryAuthorityStore>,
        roles: Arc<StaticRoles>,
        access: Arc<AccessControl>,
        hooks: AccessHooks,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryAuthorityStore::new());
        let cache = Arc::new(InMemoryAccessCache::new());
        let roles = Arc::new(StaticRoles::default());
        let access = Arc::new(AccessControl::new(
            store.clone(),
            cache,
            roles.clone(),
        ));
        access.bootstrap_roles().unwrap();
        let hooks = AccessHooks::new(access.clone());
        Harness {
            store,
            roles,
            access,
            hooks,
        }
    }

    fn grant(h: &Harness, user: UserId, kind: PermissionKind, in_company: CompanyId) {
        let desired: PermissionSet = [(kind, true)].into_iter().collect();
        h.access.set_permissions(in_company, user, &desired).unwrap();
    }

    #[test]
    fn role_change_resets_the_union_of_old_and_new() {
        let update = UserUpdate {
            role_changed: true,
            old_companies: vec![company(2), company(1), company(2)],
            new_companies: vec![company(2), company(3)],
        };
        assert_eq!(
            update.companies_to_reset(),
            vec![company(1), company(2), company(3)]
        );
    }

    #[test]
    fn company_change_resets_only_removed_companies() {
        let update = UserUpdate {
            role_changed: false,
            old_companies: vec![company(1), company(2)],
            new_companies: vec![company(2), company(3)],
        };
        assert_eq!(update.companies_to_reset(), vec![company(1)]);
    }

    #[test]
    fn unchanged_company_list_resets_nothing() {
        let update = UserUpdate {
            role_changed: false,
            old_companies: vec![company(1)],
            new_companies: vec![company(1)],
        };
        assert!(update.companies_to_reset().is_empty());
    }

    #[test]
    fn created_user_receives_its_role() {
        let h = harness();
        let user = UserId::new(7);
        h.hooks.on_user_created(user, Role::Admin).unwrap();
        assert!(h
            .store
            .check_access(user, Authority::Role(Role::Admin))
            .unwrap());
    }

    #[test]
    fn created_company_receives_the_full_catalog() {
        let h = harness();
        h.hooks.on_company_created(company(5)).unwrap();
        for kind in PermissionKind::ALL {
            let name = PermissionName::new(kind, company(5));
            let record = h.store.permission(name).unwrap().expect("permission exists");
            assert_eq!(record.description, kind.description());
        }
    }

    #[test]
    fn demotion_clears_every_reachable_company() {
        let h = harness();
        let user = UserId::new(9);
        h.roles.set(user, Role::Admin);
        h.hooks.on_user_created(user, Role::Admin).unwrap();
        for id in [1, 2, 3] {
            h.hooks.on_company_created(company(id)).unwrap();
        }
        grant(&h, user, PermissionKind::ManageDevices, company(1));
        grant(&h, user, PermissionKind::ViewDevices, company(2));

        // Demoted to a plain user of company 3.
        h.roles.set(user, Role::User);
        h.hooks
            .on_user_updated(
                user,
                &UserUpdate {
                    role_changed: true,
                    old_companies: vec![company(1), company(2)],
                    new_companies: vec![company(3)],
                },
            )
            .unwrap();

        for id in [1, 2, 3] {
            let set = h.access.permissions(company(id), user).unwrap();
            assert!(set.values().all(|allowed| !allowed), "company {id} not cleared");
            assert!(!set.contains_key(&PermissionKind::ManageUsers));
        }
    }

    #[test]
    fn dropped_company_is_cleared_and_kept_company_is_untouched() {
        let h = harness();
        let user = UserId::new(9);
        h.roles.set(user, Role::Admin);
        h.hooks.on_user_created(user, Role::Admin).unwrap();
        for id in [1, 2] {
            h.hooks.on_company_created(company(id)).unwrap();
        }
        grant(&h, user, PermissionKind::ManageDevices, company(1));
        grant(&h, user, PermissionKind::ViewDevices, company(2));

        h.hooks
            .on_user_updated(
                user,
                &UserUpdate {
                    role_changed: false,
                    old_companies: vec![company(1), company(2)],
                    new_companies: vec![company(2)],
                },
            )
            .unwrap();

        let dropped = h.access.permissions(company(1), user).unwrap();
        assert!(dropped.values().all(|allowed| !allowed));

        let kept = h.access.permissions(company(2), user).unwrap();
        assert_eq!(kept[&PermissionKind::ViewDevices], true);
    }
}
