//! Domain models for the resonanz registry.

pub mod address;
pub mod tenant;

use serde::{Deserialize, Serialize};

/// Outcome of a find-or-create operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub record: T,
    /// `true` when this call inserted the record, `false` when an
    /// existing record was returned.
    pub created: bool,
}

impl<T> Persisted<T> {
    pub fn created(record: T) -> Self {
        Self {
            record,
            created: true,
        }
    }

    pub fn existing(record: T) -> Self {
        Self {
            record,
            created: false,
        }
    }
}
