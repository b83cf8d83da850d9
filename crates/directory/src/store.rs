//! In-memory user/company record store.
//!
//! Mutations here are plain record writes; post-commit side effects are
//! the `Registrar`'s concern. The store also answers the access layer's
//! role lookups.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use metergrid_access::{AccessError, AccessResult, Role, RoleLookup};
use metergrid_core::{CompanyId, DomainError, UserId};

use crate::company::{Company, CompanyPatch, NewCompany, normalize_title};
use crate::error::{DirectoryError, DirectoryResult};
use crate::user::{NewUser, User, UserPatch, normalize_companies, normalize_email, normalize_name};

/// In-memory record store with sequential numeric ids.
#[derive(Debug)]
pub struct Directory {
    users: RwLock<BTreeMap<UserId, User>>,
    companies: RwLock<BTreeMap<CompanyId, Company>>,
    next_user_id: AtomicI64,
    next_company_id: AtomicI64,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            companies: RwLock::new(BTreeMap::new()),
            next_user_id: AtomicI64::new(1),
            next_company_id: AtomicI64::new(1),
        }
    }

    fn read_users(&self) -> DirectoryResult<RwLockReadGuard<'_, BTreeMap<UserId, User>>> {
        self.users
            .read()
            .map_err(|_| DirectoryError::Unavailable("user records lock poisoned".to_string()))
    }

    fn write_users(&self) -> DirectoryResult<RwLockWriteGuard<'_, BTreeMap<UserId, User>>> {
        self.users
            .write()
            .map_err(|_| DirectoryError::Unavailable("user records lock poisoned".to_string()))
    }

    fn read_companies(&self) -> DirectoryResult<RwLockReadGuard<'_, BTreeMap<CompanyId, Company>>> {
        self.companies
            .read()
            .map_err(|_| DirectoryError::Unavailable("company records lock poisoned".to_string()))
    }

    fn write_companies(
        &self,
    ) -> DirectoryResult<RwLockWriteGuard<'_, BTreeMap<CompanyId, Company>>> {
        self.companies
            .write()
            .map_err(|_| DirectoryError::Unavailable("company records lock poisoned".to_string()))
    }

    pub(crate) fn insert_user(&self, new: NewUser) -> DirectoryResult<User> {
        let email = normalize_email(&new.email)?;
        let name = normalize_name(&new.name)?;
        if new.role == Role::SuperAdmin {
            return Err(DomainError::validation("role must be admin or user").into());
        }
        if new.companies.is_empty() {
            return Err(DomainError::validation("at least one company is required").into());
        }
        let companies = normalize_companies(new.role, &new.companies);

        let mut users = self.write_users()?;
        if users.values().any(|user| user.email == email) {
            return Err(DomainError::conflict("email already registered").into());
        }

        let id = UserId::new(self.next_user_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let user = User {
            id,
            email,
            name,
            enabled: true,
            role: new.role,
            companies,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    /// Apply a patch and return the record before and after the write.
    pub(crate) fn apply_user_patch(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> DirectoryResult<(User, User)> {
        let mut users = self.write_users()?;
        let before = users.get(&id).cloned().ok_or(DomainError::NotFound)?;
        let mut after = before.clone();

        if let Some(email) = patch.email {
            let email = normalize_email(&email)?;
            if users.values().any(|user| user.id != id && user.email == email) {
                return Err(DomainError::conflict("email already registered").into());
            }
            after.email = email;
        }
        if let Some(name) = patch.name {
            after.name = normalize_name(&name)?;
        }
        if let Some(enabled) = patch.enabled {
            after.enabled = enabled;
        }
        if let Some(role) = patch.role {
            if role == Role::SuperAdmin {
                return Err(DomainError::validation("role must be admin or user").into());
            }
            after.role = role;
        }
        if let Some(companies) = patch.companies {
            if companies.is_empty() {
                return Err(DomainError::validation("at least one company is required").into());
            }
            after.companies = companies;
        }
        // Re-normalize against the (possibly changed) role: a demotion to
        // `user` truncates the list even without a companies patch.
        after.companies = normalize_companies(after.role, &after.companies);
        after.updated_at = Utc::now();

        users.insert(id, after.clone());
        Ok((before, after))
    }

    pub(crate) fn insert_company(&self, new: NewCompany) -> DirectoryResult<Company> {
        let title = normalize_title(&new.title)?;

        let mut companies = self.write_companies()?;
        if companies.values().any(|company| company.title == title) {
            return Err(DomainError::conflict("title already registered").into());
        }

        let id = CompanyId::new(self.next_company_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let company = Company {
            id,
            title,
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        companies.insert(id, company.clone());
        Ok(company)
    }

    pub(crate) fn apply_company_patch(
        &self,
        id: CompanyId,
        patch: CompanyPatch,
    ) -> DirectoryResult<Company> {
        let mut companies = self.write_companies()?;
        let mut company = companies.get(&id).cloned().ok_or(DomainError::NotFound)?;

        if let Some(title) = patch.title {
            let title = normalize_title(&title)?;
            if companies
                .values()
                .any(|other| other.id != id && other.title == title)
            {
                return Err(DomainError::conflict("title already registered").into());
            }
            company.title = title;
        }
        if let Some(enabled) = patch.enabled {
            company.enabled = enabled;
        }
        company.updated_at = Utc::now();

        companies.insert(id, company.clone());
        Ok(company)
    }

    pub fn user(&self, id: UserId) -> DirectoryResult<Option<User>> {
        Ok(self.read_users()?.get(&id).cloned())
    }

    /// All users, ordered by id.
    pub fn users(&self) -> DirectoryResult<Vec<User>> {
        Ok(self.read_users()?.values().cloned().collect())
    }

    pub fn company(&self, id: CompanyId) -> DirectoryResult<Option<Company>> {
        Ok(self.read_companies()?.get(&id).cloned())
    }

    /// All companies, ordered by id.
    pub fn companies(&self) -> DirectoryResult<Vec<Company>> {
        Ok(self.read_companies()?.values().cloned().collect())
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleLookup for Directory {
    fn role_of(&self, user: UserId) -> AccessResult<Option<Role>> {
        let users = self
            .users
            .read()
            .map_err(|_| AccessError::StoreUnavailable("user records lock poisoned".to_string()))?;
        Ok(users.get(&user).map(|user| user.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_admin(email: &str, companies: &[i64]) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test Admin".to_string(),
            role: Role::Admin,
            companies: companies.iter().map(|id| CompanyId::new(*id)).collect(),
        }
    }

    #[test]
    fn ids_are_allocated_sequentially() {
        let directory = Directory::new();
        let first = directory.insert_user(new_admin("a@example.com", &[1])).unwrap();
        let second = directory.insert_user(new_admin("b@example.com", &[1])).unwrap();
        assert_eq!(first.id, UserId::new(1));
        assert_eq!(second.id, UserId::new(2));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let directory = Directory::new();
        directory.insert_user(new_admin("a@example.com", &[1])).unwrap();
        let err = directory
            .insert_user(new_admin(" A@Example.com ", &[1]))
            .unwrap_err();
        assert_eq!(
            err,
            DirectoryError::Domain(DomainError::conflict("email already registered"))
        );
    }

    #[test]
    fn super_admin_cannot_be_created() {
        let directory = Directory::new();
        let err = directory
            .insert_user(NewUser {
                email: "root@example.com".to_string(),
                name: "Root".to_string(),
                role: Role::SuperAdmin,
                companies: vec![CompanyId::new(1)],
            })
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn patch_reports_before_and_after() {
        let directory = Directory::new();
        let user = directory
            .insert_user(new_admin("a@example.com", &[2, 1]))
            .unwrap();
        assert_eq!(user.companies, vec![CompanyId::new(1), CompanyId::new(2)]);

        let (before, after) = directory
            .apply_user_patch(
                user.id,
                UserPatch {
                    companies: Some(vec![CompanyId::new(2), CompanyId::new(3)]),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        assert_eq!(before.companies, vec![CompanyId::new(1), CompanyId::new(2)]);
        assert_eq!(after.companies, vec![CompanyId::new(2), CompanyId::new(3)]);
    }

    #[test]
    fn demotion_truncates_the_company_list() {
        let directory = Directory::new();
        let user = directory
            .insert_user(new_admin("a@example.com", &[1, 2, 3]))
            .unwrap();

        let (_, after) = directory
            .apply_user_patch(
                user.id,
                UserPatch {
                    role: Some(Role::User),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        assert_eq!(after.role, Role::User);
        assert_eq!(after.companies, vec![CompanyId::new(1)]);
    }

    #[test]
    fn role_lookup_reflects_records() {
        let directory = Directory::new();
        let user = directory.insert_user(new_admin("a@example.com", &[1])).unwrap();
        assert_eq!(directory.role_of(user.id).unwrap(), Some(Role::Admin));
        assert_eq!(directory.role_of(UserId::new(404)).unwrap(), None);
    }

    #[test]
    fn duplicate_company_title_is_rejected() {
        let directory = Directory::new();
        directory
            .insert_company(NewCompany {
                title: "Vector Energy".to_string(),
            })
            .unwrap();
        let err = directory
            .insert_company(NewCompany {
                title: " Vector Energy ".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn disabling_a_company_keeps_the_record() {
        let directory = Directory::new();
        let company = directory
            .insert_company(NewCompany {
                title: "Vector Energy".to_string(),
            })
            .unwrap();

        let updated = directory
            .apply_company_patch(
                company.id,
                CompanyPatch {
                    enabled: Some(false),
                    ..CompanyPatch::default()
                },
            )
            .unwrap();
        assert!(!updated.enabled);
        assert!(directory.company(company.id).unwrap().is_some());
    }
}
