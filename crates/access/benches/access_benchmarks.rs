use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use metergrid_access::{
    AccessCache, AccessControl, AccessKey, AccessResult, InMemoryAccessCache,
    InMemoryAuthorityStore, PermissionKind, PermissionSet, Role, RoleLookup,
};
use metergrid_core::{CompanyId, UserId};

/// Every subject is an admin; role lookups never miss.
struct AllAdmins;

impl RoleLookup for AllAdmins {
    fn role_of(&self, _user: UserId) -> AccessResult<Option<Role>> {
        Ok(Some(Role::Admin))
    }
}

fn setup(companies: i64) -> (AccessControl, Arc<InMemoryAccessCache>) {
    let store = Arc::new(InMemoryAuthorityStore::new());
    let cache = Arc::new(InMemoryAccessCache::new());
    let access = AccessControl::new(store, cache.clone(), Arc::new(AllAdmins));
    access.bootstrap_roles().unwrap();
    for id in 1..=companies {
        access
            .create_company_permissions(CompanyId::new(id))
            .unwrap();
    }
    (access, cache)
}

fn full_set(granted: bool) -> PermissionSet {
    PermissionKind::ALL
        .iter()
        .map(|kind| (*kind, granted))
        .collect()
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("permission_evaluation");
    group.sample_size(1000);

    // Every read recomputes the full catalog against the store.
    group.bench_function("cold_read", |b| {
        let (access, cache) = setup(1);
        let company = CompanyId::new(1);
        let user = UserId::new(9);
        access.assign_role(user, Role::Admin).unwrap();
        access
            .set_permissions(company, user, &full_set(true))
            .unwrap();

        b.iter(|| {
            cache.delete(AccessKey::new(company, user)).unwrap();
            black_box(access.permissions(company, user).unwrap());
        });
    });

    // Steady state: the memoized set is served without store reads.
    group.bench_function("cached_read", |b| {
        let (access, _cache) = setup(1);
        let company = CompanyId::new(1);
        let user = UserId::new(9);
        access.assign_role(user, Role::Admin).unwrap();
        access
            .set_permissions(company, user, &full_set(true))
            .unwrap();
        access.permissions(company, user).unwrap();

        b.iter(|| black_box(access.permissions(company, user).unwrap()));
    });

    group.finish();
}

fn bench_mutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("permission_mutation");

    // Worst case: every kind flips, so every kind is revoked and half are
    // re-assigned.
    group.bench_function("flip_full_set", |b| {
        let (access, _cache) = setup(1);
        let company = CompanyId::new(1);
        let user = UserId::new(9);
        access.assign_role(user, Role::Admin).unwrap();

        let mut granted = false;
        b.iter(|| {
            granted = !granted;
            access
                .set_permissions(company, user, &full_set(black_box(granted)))
                .unwrap();
        });
    });

    // Best case: the desired set equals the current one and no store
    // write happens at all.
    group.bench_function("identical_set", |b| {
        let (access, _cache) = setup(1);
        let company = CompanyId::new(1);
        let user = UserId::new(9);
        access.assign_role(user, Role::Admin).unwrap();
        let desired = full_set(true);
        access.set_permissions(company, user, &desired).unwrap();

        b.iter(|| access.set_permissions(company, user, black_box(&desired)).unwrap());
    });

    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("permission_reset");

    for company_count in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("reset_across_companies", company_count),
            company_count,
            |b, &count| {
                let (access, _cache) = setup(count);
                let user = UserId::new(9);
                access.assign_role(user, Role::Admin).unwrap();
                let companies: Vec<CompanyId> = (1..=count).map(CompanyId::new).collect();
                for &company in &companies {
                    access
                        .set_permissions(company, user, &full_set(true))
                        .unwrap();
                }

                b.iter(|| access.reset_permissions(user, black_box(&companies)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluation, bench_mutation, bench_reset);
criterion_main!(benches);
