//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Records are never updated or
//! deleted through these traits; writes go through find-or-create so
//! repeated registrations stay idempotent.

use crate::error::ResonanzResult;
use crate::models::Persisted;
use crate::models::address::{Address, CreateAddress};
use crate::models::tenant::{CreateTenant, Tenant};

pub trait AddressRepository: Send + Sync {
    /// Return the stored address with the same identity as `input`,
    /// inserting it first if none exists.
    fn find_or_create(
        &self,
        input: CreateAddress,
    ) -> impl Future<Output = ResonanzResult<Persisted<Address>>> + Send;
    /// Lookup by identity without inserting.
    fn find(
        &self,
        input: &CreateAddress,
    ) -> impl Future<Output = ResonanzResult<Option<Address>>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = ResonanzResult<Address>> + Send;
    /// All addresses ordered by id.
    fn list(&self) -> impl Future<Output = ResonanzResult<Vec<Address>>> + Send;
}

pub trait TenantRepository: Send + Sync {
    /// Return the tenant with the same (case-insensitive name, address)
    /// pair, inserting it first if none exists.
    ///
    /// `input.address_id` must reference a persisted address; the write
    /// is rejected otherwise.
    fn find_or_create(
        &self,
        input: CreateTenant,
    ) -> impl Future<Output = ResonanzResult<Persisted<Tenant>>> + Send;
    /// Every tenant, ordered by id.
    fn list_all(&self) -> impl Future<Output = ResonanzResult<Vec<Tenant>>> + Send;
    fn find_by_address(
        &self,
        address_id: i64,
    ) -> impl Future<Output = ResonanzResult<Vec<Tenant>>> + Send;
    /// Tenants whose name matches `name` case-insensitively.
    fn find_by_name(&self, name: &str) -> impl Future<Output = ResonanzResult<Vec<Tenant>>> + Send;
}
