//! Registry error types.

use resonanz_core::error::ResonanzError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no address specified")]
    EmptyAddress,

    #[error("no tenant name specified")]
    EmptyName,

    #[error("expected 2 columns (name, address), got {0}")]
    MalformedRow(usize),

    #[error("could not normalize address `{0}`")]
    NotResolved(String),
}

impl From<RegistryError> for ResonanzError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::EmptyAddress
            | RegistryError::EmptyName
            | RegistryError::MalformedRow(_) => ResonanzError::InvalidInput {
                message: err.to_string(),
            },
            RegistryError::NotResolved(address) => ResonanzError::AddressNotResolved { address },
        }
    }
}
