//! `metergrid-access` — company-scoped authorization core.
//!
//! Combines three global roles (`superAdmin` ⊃ `admin`, `superAdmin` ⊃
//! `user`) with per-company named permissions. Each company owns one
//! permission per catalog kind; users are granted permissions company by
//! company, and a permission cache memoizes the evaluated sets until a
//! grant/revoke path invalidates them.
//!
//! This crate is intentionally decoupled from HTTP and record storage.

pub mod authority;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod hooks;
pub mod role;
pub mod service;
pub mod store;

pub use authority::{Authority, PermissionName};
pub use cache::{AccessCache, AccessKey, CacheSettings, InMemoryAccessCache, PermissionSet};
pub use catalog::PermissionKind;
pub use error::{AccessError, AccessResult};
pub use hooks::{AccessHooks, UserUpdate};
pub use role::Role;
pub use service::{AccessControl, RoleLookup};
pub use store::{AuthorityStore, InMemoryAuthorityStore, PermissionRecord, RoleRecord};
