//! Integration tests for the registry service using in-memory SurrealDB
//! and a stub geocoder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use resonanz_core::error::ResonanzError;
use resonanz_core::geocoding::Geocoder;
use resonanz_core::models::address::{AddressIdentity, CreateAddress};
use resonanz_core::repository::{AddressRepository, TenantRepository};
use resonanz_db::repository::{SurrealAddressRepository, SurrealTenantRepository};
use resonanz_registry::RegistryService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Resolves a fixed set of spellings to canonical addresses.
#[derive(Default)]
struct StubGeocoder {
    known: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    fn with(mut self, raw: &str, canonical: &str) -> Self {
        self.known.insert(raw.to_string(), canonical.to_string());
        self
    }
}

impl Geocoder for StubGeocoder {
    async fn normalize(&self, raw: &str) -> Option<CreateAddress> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.known.get(raw).map(CreateAddress::plain)
    }
}

type Service = RegistryService<StubGeocoder, SurrealAddressRepository<Db>, SurrealTenantRepository<Db>>;

fn geocoder() -> StubGeocoder {
    StubGeocoder::default()
        .with("10 downing st london", "10 Downing Street, London SW1A 2AA, UK")
        .with("10 Downing Street", "10 Downing Street, London SW1A 2AA, UK")
        .with("221b baker st", "221B Baker Street, London NW1 6XE, UK")
        .with("1 Rothschild", "Rothschild Blvd 1, Tel Aviv-Yafo, Israel")
        .with("4 Privet Drive", "4 Privet Drive, Little Whinging, UK")
}

/// Helper: spin up in-memory DB, run migrations, build the service.
async fn setup(geocoder: StubGeocoder) -> (Service, Surreal<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    resonanz_db::run_migrations(&db).await.unwrap();

    let service = RegistryService::new(
        geocoder,
        SurrealAddressRepository::new(db.clone(), AddressIdentity::FullAddress),
        SurrealTenantRepository::new(db.clone()),
    );
    (service, db)
}

fn row(name: &str, address: &str) -> Vec<String> {
    vec![name.to_string(), address.to_string()]
}

#[tokio::test]
async fn register_happy_path() {
    let (svc, _db) = setup(geocoder()).await;

    let reg = svc
        .register_tenant("Sherlock Holmes", "221b baker st")
        .await
        .unwrap();

    assert!(reg.tenant_created);
    assert!(reg.address_created);
    assert_eq!(reg.tenant.name, "Sherlock Holmes");
    assert_eq!(reg.tenant.address_id, reg.address.id);
    assert_eq!(reg.address.full_address, "221B Baker Street, London NW1 6XE, UK");
}

#[tokio::test]
async fn registration_is_idempotent() {
    let (svc, db) = setup(geocoder()).await;

    let first = svc.register_tenant("Larry", "10 downing st london").await.unwrap();
    let second = svc.register_tenant("Larry", "10 downing st london").await.unwrap();

    assert_eq!(first.tenant.id, second.tenant.id);
    assert_eq!(first.address.id, second.address.id);
    assert!(!second.tenant_created);
    assert!(!second.address_created);

    let tenants = SurrealTenantRepository::new(db.clone()).list_all().await.unwrap();
    let addresses = SurrealAddressRepository::new(db, AddressIdentity::FullAddress)
        .list()
        .await
        .unwrap();
    assert_eq!(tenants.len(), 1);
    assert_eq!(addresses.len(), 1);
}

#[tokio::test]
async fn different_spellings_share_one_address() {
    let (svc, _db) = setup(geocoder()).await;

    let a = svc.register_tenant("Larry", "10 downing st london").await.unwrap();
    let b = svc.register_tenant("Rishi", "10 Downing Street").await.unwrap();

    assert_eq!(a.address.id, b.address.id);
    assert!(!b.address_created);
    assert!(b.tenant_created);
    assert_ne!(a.tenant.id, b.tenant.id);
}

#[tokio::test]
async fn same_name_at_two_addresses_is_two_tenants() {
    let (svc, _db) = setup(geocoder()).await;

    let a = svc.register_tenant("Alex Little", "221b baker st").await.unwrap();
    let b = svc.register_tenant("Alex Little", "1 Rothschild").await.unwrap();

    assert!(a.tenant_created && b.tenant_created);
    assert_ne!(a.tenant.id, b.tenant.id);
    assert_ne!(a.address.id, b.address.id);
}

#[tokio::test]
async fn empty_address_is_invalid_input_without_geocoding() {
    let (svc, _db) = setup(geocoder()).await;

    let err = svc.register_tenant("X", "").await.unwrap_err();
    assert!(matches!(err, ResonanzError::InvalidInput { .. }));

    let err = svc.register_tenant("X", "   ").await.unwrap_err();
    assert!(matches!(err, ResonanzError::InvalidInput { .. }));

    assert_eq!(svc.geocoder().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_name_is_invalid_input() {
    let (svc, _db) = setup(geocoder()).await;

    let err = svc.register_tenant("  ", "221b baker st").await.unwrap_err();
    assert!(matches!(err, ResonanzError::InvalidInput { .. }));
}

#[tokio::test]
async fn unresolvable_address_is_not_resolved() {
    let (svc, db) = setup(geocoder()).await;

    let err = svc
        .register_tenant("Nobody", "somewhere over the rainbow")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResonanzError::AddressNotResolved { ref address } if address == "somewhere over the rainbow"
    ));

    let addresses = SurrealAddressRepository::new(db, AddressIdentity::FullAddress)
        .list()
        .await
        .unwrap();
    assert!(addresses.is_empty(), "nothing should be persisted");
}

#[tokio::test]
async fn batch_counts_partial_failures() {
    let (svc, db) = setup(geocoder()).await;

    let rows = vec![
        row("Sherlock Holmes", "221b baker st"),
        row("Larry", "10 downing st london"),
        vec!["only one column".to_string()],
        row("Nobody", "unknown place"),
        row("Harry Potter", "4 Privet Drive"),
    ];

    let outcome = svc.register_batch(rows).await;

    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.failed, 2);
    assert!(!outcome.is_complete());

    let failed_rows: Vec<usize> = outcome.failures.iter().map(|f| f.row).collect();
    assert_eq!(failed_rows, vec![3, 4]);
    assert_eq!(outcome.failures[0].category, "invalid_input");
    assert_eq!(outcome.failures[1].category, "address_not_resolved");

    let tenants = SurrealTenantRepository::new(db).list_all().await.unwrap();
    assert_eq!(tenants.len(), 3);
}

#[tokio::test]
async fn batch_counts_duplicates_as_success() {
    let (svc, db) = setup(geocoder()).await;

    let outcome = svc
        .register_batch(vec![
            row("Larry", "10 downing st london"),
            row("LARRY", "10 Downing Street"),
        ])
        .await;

    assert_eq!(outcome.succeeded, 2);
    assert!(outcome.is_complete());
    assert_eq!(
        SurrealTenantRepository::new(db).list_all().await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn empty_batch_is_complete() {
    let (svc, _db) = setup(geocoder()).await;

    let outcome = svc.register_batch(Vec::<Vec<String>>::new()).await;
    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.is_complete());
}

#[tokio::test]
async fn tenants_at_address_uses_normalized_form() {
    let (svc, _db) = setup(geocoder()).await;

    svc.register_tenant("Larry", "10 downing st london").await.unwrap();
    svc.register_tenant("Rishi", "10 Downing Street").await.unwrap();
    svc.register_tenant("Sherlock Holmes", "221b baker st").await.unwrap();

    let tenants = svc.tenants_at_address("10 Downing Street").await.unwrap();
    let names: Vec<&str> = tenants.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Larry", "Rishi"]);
}

#[tokio::test]
async fn tenants_at_unregistered_address_is_empty() {
    let (svc, _db) = setup(geocoder()).await;

    let tenants = svc.tenants_at_address("4 Privet Drive").await.unwrap();
    assert!(tenants.is_empty());
}

#[tokio::test]
async fn tenants_at_unresolvable_address_is_an_error() {
    let (svc, _db) = setup(geocoder()).await;

    let err = svc.tenants_at_address("atlantis").await.unwrap_err();
    assert!(matches!(err, ResonanzError::AddressNotResolved { .. }));
}

#[tokio::test]
async fn addresses_for_tenant_is_case_insensitive() {
    let (svc, _db) = setup(geocoder()).await;

    svc.register_tenant("john mcgee", "221b baker st").await.unwrap();
    svc.register_tenant("John McGee", "1 Rothschild").await.unwrap();

    let upper = svc.addresses_for_tenant("JOHN MCGEE").await.unwrap();
    let lower = svc.addresses_for_tenant("john mcgee").await.unwrap();

    assert_eq!(upper, lower);
    let full: Vec<&str> = upper.iter().map(|a| a.full_address.as_str()).collect();
    assert_eq!(
        full,
        vec![
            "221B Baker Street, London NW1 6XE, UK",
            "Rothschild Blvd 1, Tel Aviv-Yafo, Israel",
        ]
    );
}

#[tokio::test]
async fn addresses_for_unknown_tenant_is_empty() {
    let (svc, _db) = setup(geocoder()).await;

    assert!(svc.addresses_for_tenant("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn addresses_for_empty_name_is_invalid_input() {
    let (svc, _db) = setup(geocoder()).await;

    let err = svc.addresses_for_tenant("").await.unwrap_err();
    assert!(matches!(err, ResonanzError::InvalidInput { .. }));
}
