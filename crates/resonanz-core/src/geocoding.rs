//! Geocoding capability used by the registry to normalize free-text
//! addresses.

use crate::models::address::CreateAddress;

/// Turns a free-text address into a normalized [`CreateAddress`].
///
/// Implementations never fail loudly: an empty input, a provider miss,
/// a transport error or a timeout all resolve to `None`. Provider
/// errors are logged by the implementation before returning.
pub trait Geocoder: Send + Sync {
    fn normalize(&self, raw: &str) -> impl Future<Output = Option<CreateAddress>> + Send;
}
