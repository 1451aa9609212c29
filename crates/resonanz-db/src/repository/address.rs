//! SurrealDB implementation of [`AddressRepository`].

use chrono::{DateTime, Utc};
use resonanz_core::error::ResonanzResult;
use resonanz_core::models::Persisted;
use resonanz_core::models::address::{
    Address, AddressComponents, AddressIdentity, CreateAddress,
};
use resonanz_core::repository::AddressRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use super::{MAX_ATTEMPTS, next_id};
use crate::error::DbError;

/// DB-side row struct for queries where the id is already known.
#[derive(Debug, SurrealValue)]
struct AddressRow {
    full_address: String,
    lat: Option<f64>,
    lon: Option<f64>,
    street_number: Option<String>,
    street_name: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    region: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    block: Option<String>,
    entrance: Option<String>,
    floor: Option<String>,
    apartment_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl AddressRow {
    fn into_address(self, id: i64) -> Address {
        Address {
            id,
            full_address: self.full_address,
            lat: self.lat,
            lon: self.lon,
            components: AddressComponents {
                street_number: self.street_number,
                street_name: self.street_name,
                neighborhood: self.neighborhood,
                city: self.city,
                region: self.region,
                postcode: self.postcode,
                country: self.country,
                block: self.block,
                entrance: self.entrance,
                floor: self.floor,
                apartment_number: self.apartment_number,
            },
            created_at: self.created_at,
        }
    }
}

/// DB-side row struct that includes the record id via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AddressRowWithId {
    record_id: i64,
    full_address: String,
    lat: Option<f64>,
    lon: Option<f64>,
    street_number: Option<String>,
    street_name: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    region: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    block: Option<String>,
    entrance: Option<String>,
    floor: Option<String>,
    apartment_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AddressRowWithId> for Address {
    fn from(row: AddressRowWithId) -> Self {
        Address {
            id: row.record_id,
            full_address: row.full_address,
            lat: row.lat,
            lon: row.lon,
            components: AddressComponents {
                street_number: row.street_number,
                street_name: row.street_name,
                neighborhood: row.neighborhood,
                city: row.city,
                region: row.region,
                postcode: row.postcode,
                country: row.country,
                block: row.block,
                entrance: row.entrance,
                floor: row.floor,
                apartment_number: row.apartment_number,
            },
            created_at: row.created_at,
        }
    }
}

/// The value stored in `identity_key`, which carries the unique index.
///
/// Under [`AddressIdentity::Components`] the key is the JSON array of
/// all eleven components, so an absent component (`null`) never equals
/// a present one, not even the string `"null"`.
fn identity_key(identity: AddressIdentity, input: &CreateAddress) -> Result<String, DbError> {
    match identity {
        AddressIdentity::FullAddress => Ok(input.full_address.clone()),
        AddressIdentity::Components => {
            let c = &input.components;
            let tuple = [
                &c.street_number,
                &c.street_name,
                &c.neighborhood,
                &c.city,
                &c.region,
                &c.postcode,
                &c.country,
                &c.block,
                &c.entrance,
                &c.floor,
                &c.apartment_number,
            ];
            serde_json::to_string(&tuple)
                .map_err(|e| DbError::Query(format!("cannot encode address components: {e}")))
        }
    }
}

/// SurrealDB implementation of the Address repository.
#[derive(Clone)]
pub struct SurrealAddressRepository<C: Connection> {
    db: Surreal<C>,
    identity: AddressIdentity,
}

impl<C: Connection> SurrealAddressRepository<C> {
    pub fn new(db: Surreal<C>, identity: AddressIdentity) -> Self {
        Self { db, identity }
    }

    pub fn identity(&self) -> AddressIdentity {
        self.identity
    }

    async fn lookup(&self, key: &str) -> Result<Option<Address>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM address \
                 WHERE identity_key = $identity_key LIMIT 1",
            )
            .bind(("identity_key", key.to_string()))
            .await?;

        let rows: Vec<AddressRowWithId> = result.take(0)?;
        Ok(rows.into_iter().next().map(Address::from))
    }

    async fn insert(&self, input: &CreateAddress, key: &str) -> Result<Address, DbError> {
        let id = next_id(&self.db, "address").await?;
        let c = input.components.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('address', $id) SET \
                 identity_key = $identity_key, full_address = $full_address, lat = $lat, lon = $lon, \
                 street_number = $street_number, street_name = $street_name, \
                 neighborhood = $neighborhood, city = $city, region = $region, \
                 postcode = $postcode, country = $country, block = $block, \
                 entrance = $entrance, floor = $floor, \
                 apartment_number = $apartment_number",
            )
            .bind(("id", id))
            .bind(("identity_key", key.to_string()))
            .bind(("full_address", input.full_address.clone()))
            .bind(("lat", input.lat))
            .bind(("lon", input.lon))
            .bind(("street_number", c.street_number))
            .bind(("street_name", c.street_name))
            .bind(("neighborhood", c.neighborhood))
            .bind(("city", c.city))
            .bind(("region", c.region))
            .bind(("postcode", c.postcode))
            .bind(("country", c.country))
            .bind(("block", c.block))
            .bind(("entrance", c.entrance))
            .bind(("floor", c.floor))
            .bind(("apartment_number", c.apartment_number))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("address", e))?;

        let rows: Vec<AddressRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "address".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_address(id))
    }
}

impl<C: Connection> AddressRepository for SurrealAddressRepository<C> {
    async fn find_or_create(&self, input: CreateAddress) -> ResonanzResult<Persisted<Address>> {
        let key = identity_key(self.identity, &input)?;

        let mut rejected: Option<String> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(existing) = self.lookup(&key).await? {
                debug!(id = existing.id, full_address = %existing.full_address, "Address already exists");
                return Ok(Persisted::existing(existing));
            }
            // The index only rejects a key that is already committed, so
            // the winner must be visible by now.
            if let Some(message) = rejected.take() {
                return Err(DbError::Constraint {
                    entity: "address".into(),
                    message,
                }
                .into());
            }

            match self.insert(&input, &key).await {
                Ok(address) => {
                    info!(id = address.id, full_address = %address.full_address, "Inserted address");
                    return Ok(Persisted::created(address));
                }
                Err(DbError::DuplicateRace { message, .. }) => {
                    debug!(
                        full_address = %input.full_address,
                        attempt,
                        %message,
                        "Lost address insert race, re-reading"
                    );
                    rejected = Some(message);
                }
                Err(DbError::WriteConflict { message, .. }) => {
                    debug!(
                        full_address = %input.full_address,
                        attempt,
                        %message,
                        "Address write conflict, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DbError::Query(format!(
            "could not settle address `{}` after {MAX_ATTEMPTS} attempts",
            input.full_address
        ))
        .into())
    }

    async fn find(&self, input: &CreateAddress) -> ResonanzResult<Option<Address>> {
        let key = identity_key(self.identity, input)?;
        Ok(self.lookup(&key).await?)
    }

    async fn get_by_id(&self, id: i64) -> ResonanzResult<Address> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('address', $id)")
            .bind(("id", id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AddressRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "address".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_address(id))
    }

    async fn list(&self) -> ResonanzResult<Vec<Address>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM address ORDER BY record_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AddressRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Address::from).collect())
    }
}
