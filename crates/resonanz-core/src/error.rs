//! Error types for the resonanz registry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResonanzError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Address could not be resolved: {address}")]
    AddressNotResolved { address: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResonanzError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable, machine-readable name of the error category.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::AddressNotResolved { .. } => "address_not_resolved",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

pub type ResonanzResult<T> = Result<T, ResonanzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_distinct() {
        let errors = [
            ResonanzError::invalid_input("empty"),
            ResonanzError::AddressNotResolved {
                address: "nowhere".into(),
            },
            ResonanzError::NotFound {
                entity: "address".into(),
                id: "1".into(),
            },
            ResonanzError::Storage("down".into()),
            ResonanzError::Internal("bug".into()),
        ];
        let mut categories: Vec<_> = errors.iter().map(|e| e.category()).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(categories.len(), errors.len());
    }

    #[test]
    fn messages_include_offending_input() {
        let err = ResonanzError::AddressNotResolved {
            address: "1 Nowhere Lane".into(),
        };
        assert!(err.to_string().contains("1 Nowhere Lane"));
    }
}
