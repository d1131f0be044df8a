//! Error types for the matching engine
//!
//! The taxonomy is deliberately small: control intents on unknown ids are
//! reported as boolean failures, not errors, and partial fills are not
//! failures at all. Only admission validation can reject an intent, and it
//! does so before any state mutation.

use crate::ids::OrderId;
use thiserror::Error;

/// Intent admission errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("order {id} has zero quantity")]
    InvalidQuantity { id: OrderId },

    #[error("order {id} is already resting in the book")]
    DuplicateOrder { id: OrderId },
}
