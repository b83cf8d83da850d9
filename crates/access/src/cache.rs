//! Permission-set cache boundary.
//!
//! Each entry memoizes one user's permission set within one company. The
//! cache is an injected capability rather than a process-wide singleton,
//! so the service can be exercised against a deterministic in-memory
//! fake. Entries carry a tag for bulk eviction when the catalog itself
//! changes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use metergrid_core::{CompanyId, UserId};

use crate::{AccessError, AccessResult, PermissionKind};

/// A user's permission set within one company, keyed in catalog order.
pub type PermissionSet = BTreeMap<PermissionKind, bool>;

/// Cache key of one `(company, user)` permission set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessKey {
    pub company_id: CompanyId,
    pub user_id: UserId,
}

impl AccessKey {
    pub const fn new(company_id: CompanyId, user_id: UserId) -> Self {
        Self {
            company_id,
            user_id,
        }
    }
}

impl core::fmt::Display for AccessKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "access_{}_{}", self.company_id, self.user_id)
    }
}

/// Cache tuning for permission sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub tag: String,
}

impl CacheSettings {
    /// Tag shared by all permission-set entries.
    pub const ACCESS_TAG: &'static str = "access";

    /// Default entry lifetime (30 days). Entries are evicted explicitly
    /// on every write path; the TTL only bounds abandoned entries.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Self::DEFAULT_TTL,
            tag: Self::ACCESS_TAG.to_string(),
        }
    }
}

/// Cache backend boundary: atomic per-key get/put/delete plus
/// delete-by-tag. No cross-key transactions are assumed.
pub trait AccessCache: Send + Sync {
    fn get(&self, key: AccessKey) -> AccessResult<Option<PermissionSet>>;

    fn put(
        &self,
        key: AccessKey,
        value: &PermissionSet,
        ttl: Duration,
        tag: &str,
    ) -> AccessResult<()>;

    fn delete(&self, key: AccessKey) -> AccessResult<()>;

    fn delete_by_tag(&self, tag: &str) -> AccessResult<()>;
}

impl<C> AccessCache for Arc<C>
where
    C: AccessCache + ?Sized,
{
    fn get(&self, key: AccessKey) -> AccessResult<Option<PermissionSet>> {
        (**self).get(key)
    }

    fn put(
        &self,
        key: AccessKey,
        value: &PermissionSet,
        ttl: Duration,
        tag: &str,
    ) -> AccessResult<()> {
        (**self).put(key, value, ttl, tag)
    }

    fn delete(&self, key: AccessKey) -> AccessResult<()> {
        (**self).delete(key)
    }

    fn delete_by_tag(&self, tag: &str) -> AccessResult<()> {
        (**self).delete_by_tag(tag)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: PermissionSet,
    tag: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache with lazy TTL expiry.
///
/// Expired entries are dropped on read; a stale entry that is never read
/// again is overwritten by the next `put` for its key.
#[derive(Debug, Default)]
pub struct InMemoryAccessCache {
    entries: RwLock<HashMap<AccessKey, CacheEntry>>,
}

impl InMemoryAccessCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AccessResult<RwLockReadGuard<'_, HashMap<AccessKey, CacheEntry>>> {
        self.entries
            .read()
            .map_err(|_| AccessError::CacheUnavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> AccessResult<RwLockWriteGuard<'_, HashMap<AccessKey, CacheEntry>>> {
        self.entries
            .write()
            .map_err(|_| AccessError::CacheUnavailable("lock poisoned".to_string()))
    }
}

impl AccessCache for InMemoryAccessCache {
    fn get(&self, key: AccessKey) -> AccessResult<Option<PermissionSet>> {
        let entries = self.read()?;
        Ok(entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    fn put(
        &self,
        key: AccessKey,
        value: &PermissionSet,
        ttl: Duration,
        tag: &str,
    ) -> AccessResult<()> {
        let mut entries = self.write()?;
        entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                tag: tag.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: AccessKey) -> AccessResult<()> {
        self.write()?.remove(&key);
        Ok(())
    }

    fn delete_by_tag(&self, tag: &str) -> AccessResult<()> {
        self.write()?.retain(|_, entry| entry.tag != tag);
        Ok(())
    }
}
