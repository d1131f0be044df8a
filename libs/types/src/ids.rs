//! Identifier types for book entities
//!
//! Order ids are supplied by the caller and treated as opaque; the engine
//! never generates one and assumes uniqueness across its lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally assigned order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Wrap a caller-assigned raw id
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for OrderId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
