//! Record mutations with post-commit access-layer hooks.
//!
//! `Registrar` is the transaction boundary: it commits a record mutation
//! to the `Directory`, then invokes the matching post-commit callback so
//! the authority store and permission cache stay in sync with the
//! records. Hooks are plain interfaces passed in at construction; a hook
//! failure propagates to the caller of the mutation (the record write is
//! not rolled back).

use std::sync::Arc;

use tracing::info;

use metergrid_access::{AccessHooks, AccessResult, UserUpdate};
use metergrid_core::{CompanyId, UserId};

use crate::company::{Company, CompanyPatch, NewCompany};
use crate::error::DirectoryResult;
use crate::store::Directory;
use crate::user::{NewUser, User, UserPatch};

/// Post-commit callbacks for user record changes.
pub trait UserHooks: Send + Sync {
    fn user_created(&self, user: &User) -> AccessResult<()>;

    fn user_updated(&self, user: &User, update: &UserUpdate) -> AccessResult<()>;
}

/// Post-commit callbacks for company record changes.
pub trait CompanyHooks: Send + Sync {
    fn company_created(&self, company: &Company) -> AccessResult<()>;
}

impl UserHooks for AccessHooks {
    fn user_created(&self, user: &User) -> AccessResult<()> {
        self.on_user_created(user.id, user.role)
    }

    fn user_updated(&self, user: &User, update: &UserUpdate) -> AccessResult<()> {
        self.on_user_updated(user.id, update)
    }
}

impl CompanyHooks for AccessHooks {
    fn company_created(&self, company: &Company) -> AccessResult<()> {
        self.on_company_created(company.id)
    }
}

/// Commits record mutations and dispatches post-commit hooks.
pub struct Registrar {
    directory: Arc<Directory>,
    user_hooks: Arc<dyn UserHooks>,
    company_hooks: Arc<dyn CompanyHooks>,
}

impl Registrar {
    pub fn new(
        directory: Arc<Directory>,
        user_hooks: Arc<dyn UserHooks>,
        company_hooks: Arc<dyn CompanyHooks>,
    ) -> Self {
        Self {
            directory,
            user_hooks,
            company_hooks,
        }
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Create a user and bind its global role.
    pub fn create_user(&self, new: NewUser) -> DirectoryResult<User> {
        let user = self.directory.insert_user(new)?;
        self.user_hooks.user_created(&user)?;
        info!(user = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Update a user. When the role or the company list changed, the
    /// post-commit hook clears stale permissions and cache entries.
    pub fn update_user(&self, id: UserId, patch: UserPatch) -> DirectoryResult<User> {
        let (before, after) = self.directory.apply_user_patch(id, patch)?;

        let update = UserUpdate {
            role_changed: before.role != after.role,
            old_companies: before.companies,
            new_companies: after.companies.clone(),
        };
        if update.role_changed || update.old_companies != update.new_companies {
            self.user_hooks.user_updated(&after, &update)?;
        }
        Ok(after)
    }

    /// Create a company and provision its permission catalog.
    pub fn create_company(&self, new: NewCompany) -> DirectoryResult<Company> {
        let company = self.directory.insert_company(new)?;
        self.company_hooks.company_created(&company)?;
        info!(company = %company.id, title = %company.title, "company registered");
        Ok(company)
    }

    /// Update a company. No post-commit hook fires: permission sets
    /// outlive deactivation.
    pub fn update_company(&self, id: CompanyId, patch: CompanyPatch) -> DirectoryResult<Company> {
        self.directory.apply_company_patch(id, patch)
    }
}
