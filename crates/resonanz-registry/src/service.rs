//! Registration and lookup orchestration.
//!
//! Registration runs: validate → normalize → address find-or-create →
//! tenant find-or-create. Normalization (and the rate-limit wait in
//! front of it) completes before any storage call is made. The address
//! is committed on its own before the tenant insert references it, so
//! an address may remain without tenants if the tenant step fails.

use resonanz_core::error::{ResonanzError, ResonanzResult};
use resonanz_core::geocoding::Geocoder;
use resonanz_core::models::address::{Address, CreateAddress};
use resonanz_core::models::tenant::{CreateTenant, Tenant};
use resonanz_core::repository::{AddressRepository, TenantRepository};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::RegistryError;

/// A tenant together with the address it was registered at.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub tenant: Tenant,
    pub address: Address,
    pub tenant_created: bool,
    pub address_created: bool,
}

/// Why a batch row was not registered.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based position of the row in the batch.
    pub row: usize,
    /// Error category, as reported by [`ResonanzError::category`].
    pub category: &'static str,
    pub reason: String,
}

/// Aggregate result of a batch registration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Registry service.
///
/// Generic over the geocoder and repository implementations so that
/// this crate has no dependency on the database or HTTP clients.
pub struct RegistryService<G: Geocoder, A: AddressRepository, T: TenantRepository> {
    geocoder: G,
    address_repo: A,
    tenant_repo: T,
}

impl<G: Geocoder, A: AddressRepository, T: TenantRepository> RegistryService<G, A, T> {
    pub fn new(geocoder: G, address_repo: A, tenant_repo: T) -> Self {
        Self {
            geocoder,
            address_repo,
            tenant_repo,
        }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Register `name` as living at `raw_address`.
    ///
    /// Idempotent: registering the same pair again returns the stored
    /// records with both `*_created` flags unset.
    pub async fn register_tenant(&self, name: &str, raw_address: &str) -> ResonanzResult<Registration> {
        let result = self.try_register(name, raw_address).await;
        if let Err(e) = &result {
            error!(
                tenant = name,
                address = raw_address,
                category = e.category(),
                error = %e,
                "Could not register tenant"
            );
        }
        result
    }

    async fn try_register(&self, name: &str, raw_address: &str) -> ResonanzResult<Registration> {
        // 1. Validate before any outbound call.
        if raw_address.trim().is_empty() {
            return Err(RegistryError::EmptyAddress.into());
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName.into());
        }

        // 2. Normalize.
        let normalized = self.resolve(raw_address).await?;

        // 3. Address find-or-create.
        let address = self.address_repo.find_or_create(normalized).await?;

        // 4. Tenant find-or-create against the stored address.
        let tenant = self
            .tenant_repo
            .find_or_create(CreateTenant {
                name: name.to_string(),
                address_id: address.record.id,
            })
            .await?;

        debug!(
            tenant_id = tenant.record.id,
            address_id = address.record.id,
            tenant_created = tenant.created,
            address_created = address.created,
            "Registered tenant"
        );

        Ok(Registration {
            tenant: tenant.record,
            address: address.record,
            tenant_created: tenant.created,
            address_created: address.created,
        })
    }

    /// Register every `(name, address)` row independently.
    ///
    /// A failing row never aborts the batch. Rows that do not have
    /// exactly two fields, fail normalization, or fail to persist are
    /// counted as failed and reported in [`BatchOutcome::failures`].
    pub async fn register_batch<I, R>(&self, rows: I) -> BatchOutcome
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let mut outcome = BatchOutcome::default();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            let result = match row.as_ref() {
                [name, raw_address] => self.register_tenant(name, raw_address).await.map(|_| ()),
                fields => {
                    let err: ResonanzError = RegistryError::MalformedRow(fields.len()).into();
                    error!(row = row_number, fields = ?fields, error = %err, "Skipping malformed row");
                    Err(err)
                }
            };

            match result {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    outcome.failed += 1;
                    outcome.failures.push(RowFailure {
                        row: row_number,
                        category: e.category(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch registration finished"
        );
        outcome
    }

    /// Tenants registered at the address `raw_address` normalizes to.
    ///
    /// An address that resolves but was never registered yields an
    /// empty list.
    pub async fn tenants_at_address(&self, raw_address: &str) -> ResonanzResult<Vec<Tenant>> {
        let result = self.try_tenants_at_address(raw_address).await;
        if let Err(e) = &result {
            error!(
                address = raw_address,
                category = e.category(),
                error = %e,
                "Could not look up tenants at address"
            );
        }
        result
    }

    async fn try_tenants_at_address(&self, raw_address: &str) -> ResonanzResult<Vec<Tenant>> {
        if raw_address.trim().is_empty() {
            return Err(RegistryError::EmptyAddress.into());
        }
        let normalized = self.resolve(raw_address).await?;

        match self.address_repo.find(&normalized).await? {
            Some(address) => self.tenant_repo.find_by_address(address.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Distinct addresses of every tenant whose name matches `name`
    /// case-insensitively, in tenant registration order.
    pub async fn addresses_for_tenant(&self, name: &str) -> ResonanzResult<Vec<Address>> {
        let result = self.try_addresses_for_tenant(name).await;
        if let Err(e) = &result {
            error!(
                tenant = name,
                category = e.category(),
                error = %e,
                "Could not look up addresses for tenant"
            );
        }
        result
    }

    async fn try_addresses_for_tenant(&self, name: &str) -> ResonanzResult<Vec<Address>> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName.into());
        }

        let tenants = self.tenant_repo.find_by_name(name).await?;

        let mut address_ids: Vec<i64> = Vec::with_capacity(tenants.len());
        for tenant in &tenants {
            if !address_ids.contains(&tenant.address_id) {
                address_ids.push(tenant.address_id);
            }
        }

        let mut addresses = Vec::with_capacity(address_ids.len());
        for id in address_ids {
            addresses.push(self.address_repo.get_by_id(id).await?);
        }
        Ok(addresses)
    }

    async fn resolve(&self, raw_address: &str) -> ResonanzResult<CreateAddress> {
        let raw_address = raw_address.trim();
        debug!(raw_address, "Normalizing address");
        self.geocoder
            .normalize(raw_address)
            .await
            .ok_or_else(|| RegistryError::NotResolved(raw_address.to_string()).into())
    }
}
