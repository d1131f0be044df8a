//! Trade execution records
//!
//! A trade is born at execution and never mutated. The execution price is
//! the resting order's limit; price improvement goes to the aggressor.

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// One execution between a buy order and a sell order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Resting side's limit price.
    pub price: Price,
    pub quantity: Quantity,
    /// Engine counter at execution time. Non-decreasing across the log;
    /// shared by every fill of a single aggressor.
    pub sequence: u64,
}

impl Trade {
    /// Create a new trade record
    pub fn new(
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        sequence: u64,
    ) -> Self {
        Self {
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            sequence,
        }
    }

    /// Check whether the given order participated in this trade
    pub fn involves(&self, id: OrderId) -> bool {
        self.buy_order_id == id || self.sell_order_id == id
    }
}
