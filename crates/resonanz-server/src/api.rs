//! JSON HTTP API over the registry service.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use resonanz_core::error::ResonanzError;
use resonanz_core::geocoding::Geocoder;
use resonanz_core::models::address::Address;
use resonanz_core::models::tenant::Tenant;
use resonanz_core::repository::{AddressRepository, TenantRepository};
use resonanz_registry::{BatchOutcome, Registration, RegistryService};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::debug;

type SharedService<G, A, T> = Arc<RegistryService<G, A, T>>;

/// A registry error rendered as `{"error": ..., "category": ...}`.
pub struct ApiError(ResonanzError);

impl From<ResonanzError> for ApiError {
    fn from(err: ResonanzError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ResonanzError::InvalidInput { .. } | ResonanzError::AddressNotResolved { .. } => {
                StatusCode::BAD_REQUEST
            }
            ResonanzError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResonanzError::Storage(_) | ResonanzError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(status = status.as_u16(), error = %self.0, "Sending error response");
        let body = json!({
            "error": self.0.to_string(),
            "category": self.0.category(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// Skip the first CSV line.
    #[serde(default)]
    pub header: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

pub fn router<G, A, T>(service: SharedService<G, A, T>) -> Router
where
    G: Geocoder + 'static,
    A: AddressRepository + 'static,
    T: TenantRepository + 'static,
{
    // Searching addresses finds tenants and vice versa, hence the names.
    Router::new()
        .route("/health", get(health))
        .route("/insert/_tenant", post(register_tenant::<G, A, T>))
        .route("/insert/_batch", post(register_batch::<G, A, T>))
        .route("/search/_tenants", get(tenants_at_address::<G, A, T>))
        .route("/search/_addresses", get(addresses_for_tenant::<G, A, T>))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn register_tenant<G, A, T>(
    State(service): State<SharedService<G, A, T>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>), ApiError>
where
    G: Geocoder + 'static,
    A: AddressRepository + 'static,
    T: TenantRepository + 'static,
{
    let registration = service
        .register_tenant(&request.name, &request.address)
        .await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

async fn register_batch<G, A, T>(
    State(service): State<SharedService<G, A, T>>,
    Query(query): Query<BatchQuery>,
    body: String,
) -> (StatusCode, Json<BatchOutcome>)
where
    G: Geocoder + 'static,
    A: AddressRepository + 'static,
    T: TenantRepository + 'static,
{
    let rows = parse_rows(&body, query.header);
    let outcome = service.register_batch(rows).await;

    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::PARTIAL_CONTENT
    };
    (status, Json(outcome))
}

async fn tenants_at_address<G, A, T>(
    State(service): State<SharedService<G, A, T>>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Vec<Tenant>>, ApiError>
where
    G: Geocoder + 'static,
    A: AddressRepository + 'static,
    T: TenantRepository + 'static,
{
    Ok(Json(service.tenants_at_address(&query.address).await?))
}

async fn addresses_for_tenant<G, A, T>(
    State(service): State<SharedService<G, A, T>>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Address>>, ApiError>
where
    G: Geocoder + 'static,
    A: AddressRepository + 'static,
    T: TenantRepository + 'static,
{
    Ok(Json(service.addresses_for_tenant(&query.name).await?))
}

/// Split a two-column `(name, address)` CSV body into rows.
///
/// Rows keep whatever number of fields they have; a row the CSV reader
/// cannot decode becomes an empty row. Both are counted as malformed
/// by the registry.
fn parse_rows(body: &str, has_header: bool) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    reader
        .records()
        .map(|record| match record {
            Ok(record) => record.iter().map(str::to_string).collect(),
            Err(e) => {
                debug!(error = %e, "Unreadable CSV record");
                Vec::new()
            }
        })
        .collect()
}
