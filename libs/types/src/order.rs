//! Order intent types
//!
//! An [`Order`] describes a caller intent. The `sequence` field is always
//! overwritten by the engine on admission; whatever the caller puts there is
//! ignored for time priority.

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Intent type
///
/// LIMIT and MARKET describe liquidity; CANCEL and MODIFY are control
/// intents keyed by [`OrderId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    LIMIT,
    MARKET,
    CANCEL,
    MODIFY,
}

/// Order intent record
///
/// For MARKET the price is ignored; for CANCEL the price and quantity are
/// ignored; for MODIFY they carry the replacement values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    /// Engine-assigned admission sequence; caller value is discarded.
    pub sequence: u64,
}

impl Order {
    /// Create an order intent
    pub fn new(
        id: OrderId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            side,
            order_type,
            price,
            quantity,
            sequence: 0,
        }
    }

    /// Limit order intent
    pub fn limit(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self::new(id, side, OrderType::LIMIT, price, quantity)
    }

    /// Market order intent; the price field is not consulted
    pub fn market(id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(id, side, OrderType::MARKET, Price::new(0), quantity)
    }

    /// Cancel intent for a resting order
    pub fn cancel(id: OrderId) -> Self {
        Self::new(id, Side::BUY, OrderType::CANCEL, Price::new(0), Quantity::zero())
    }

    /// Modify intent carrying the replacement price and quantity
    pub fn modify(id: OrderId, new_price: Price, new_quantity: Quantity) -> Self {
        Self::new(id, Side::BUY, OrderType::MODIFY, new_price, new_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::BUY.opposite(), Side::SELL);
        assert_eq!(Side::SELL.opposite(), Side::BUY);
    }

    #[test]
    fn test_limit_intent() {
        let order = Order::limit(
            OrderId::new(1),
            Side::BUY,
            Price::new(10000),
            Quantity::new(100),
        );

        assert_eq!(order.order_type, OrderType::LIMIT);
        assert_eq!(order.price, Price::new(10000));
        assert_eq!(order.sequence, 0);
    }

    #[test]
    fn test_market_intent_ignores_price() {
        let order = Order::market(OrderId::new(2), Side::SELL, Quantity::new(50));
        assert_eq!(order.order_type, OrderType::MARKET);
        assert_eq!(order.quantity, Quantity::new(50));
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::BUY).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&OrderType::LIMIT).unwrap(), "\"LIMIT\"");
    }
}
