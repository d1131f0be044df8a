//! Trade execution logic
//!
//! Owns the engine sequence counter and builds trade records. The counter
//! advances once per admitted intent, never per fill: every fill of one
//! aggressor is stamped with the counter's current value, so trade sequences
//! are non-decreasing but not strictly increasing.

use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Sequence authority and trade factory
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: starting_sequence,
        }
    }

    /// Take the next admission sequence (monotonically increasing)
    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Current counter value; used to stamp executions
    pub fn current_sequence(&self) -> u64 {
        self.sequence_counter
    }

    /// Build a trade between the aggressor and a resting order
    ///
    /// The buy/sell id slots are assigned from the aggressor's side; the
    /// price is the resting order's limit.
    pub fn execute_trade(
        &self,
        aggressor_id: OrderId,
        aggressor_side: Side,
        resting_id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> Trade {
        let (buy_order_id, sell_order_id) = match aggressor_side {
            Side::BUY => (aggressor_id, resting_id),
            Side::SELL => (resting_id, aggressor_id),
        };

        Trade::new(
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            self.sequence_counter,
        )
    }
}
