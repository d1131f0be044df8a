//! Matching engine core
//!
//! Main coordinator for the two side books, the order index, and the trade
//! log. Every submitted intent runs to completion synchronously and leaves
//! the book in an invariant-satisfying state before returning.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use types::errors::EngineError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};
use types::trade::Trade;

use crate::book::{AskBook, BidBook, PriceLevel};
use crate::index::{OpenOrder, OrderIndex};
use crate::matching::{crossing, MatchExecutor};
use crate::trade_log::TradeLog;

/// Single-instrument matching engine
///
/// Owns all book state; not safe for concurrent use. A multi-threaded
/// deployment serializes intents through a dispatcher above this type.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    bids: BidBook,
    asks: AskBook,
    index: OrderIndex,
    executor: MatchExecutor,
    log: TradeLog,
}

/// Result of submitting an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Limit order rested in full (no match)
    Resting,
    /// Some quantity executed; the remainder rested (limit) or was
    /// discarded (market). A market order that found no liquidity reports
    /// its whole quantity here with no trades.
    PartiallyFilled {
        trades: Vec<Trade>,
        remaining: Quantity,
    },
    /// Incoming quantity fully executed
    Filled { trades: Vec<Trade> },
    /// Cancel or modify intent, with its success flag
    Control { accepted: bool },
}

/// Order book snapshot for market data consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Best-first (price, open quantity) per bid level
    pub bids: Vec<(Price, Quantity)>,
    /// Best-first (price, open quantity) per ask level
    pub asks: Vec<(Price, Quantity)>,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    /// Create a new matching engine with the sequence counter at zero
    pub fn new() -> Self {
        Self::with_starting_sequence(0)
    }

    /// Create a new matching engine with a starting sequence
    pub fn with_starting_sequence(starting_sequence: u64) -> Self {
        Self {
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: OrderIndex::new(),
            executor: MatchExecutor::new(starting_sequence),
            log: TradeLog::new(),
        }
    }

    /// Submit an order intent
    ///
    /// This is the main entry point. Validation happens before any state
    /// mutation; every accepted intent then consumes one admission sequence
    /// and is dispatched by type. Control intents report their boolean
    /// outcome through [`SubmitResult::Control`].
    pub fn submit(&mut self, intent: Order) -> Result<SubmitResult, EngineError> {
        match intent.order_type {
            OrderType::LIMIT | OrderType::MARKET if intent.quantity.is_zero() => {
                return Err(EngineError::InvalidQuantity { id: intent.id });
            }
            OrderType::LIMIT if self.index.contains(&intent.id) => {
                return Err(EngineError::DuplicateOrder { id: intent.id });
            }
            _ => {}
        }

        let sequence = self.executor.next_sequence();
        debug!(
            order_id = %intent.id,
            order_type = ?intent.order_type,
            sequence,
            "intent admitted"
        );

        Ok(match intent.order_type {
            OrderType::LIMIT => {
                self.place_limit(intent.id, intent.side, intent.price, intent.quantity, sequence)
            }
            OrderType::MARKET => self.place_market(intent.id, intent.side, intent.quantity),
            OrderType::CANCEL => SubmitResult::Control {
                accepted: self.cancel(intent.id),
            },
            OrderType::MODIFY => SubmitResult::Control {
                accepted: self.modify(intent.id, intent.price, intent.quantity),
            },
        })
    }

    /// Cancel a resting order
    ///
    /// Returns false and leaves state untouched when the id is unknown.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        let Some(open) = self.index.remove(&id) else {
            debug!(order_id = %id, "cancel for unknown order");
            return false;
        };

        // The queue slot stays behind as a tombstone; only the counters and,
        // when the level dies, the level itself are touched here.
        match open.side {
            Side::BUY => {
                if let Some(level) = self.bids.level_mut(open.price) {
                    level.retire(open.remaining);
                    if level.is_exhausted() {
                        self.bids.remove_level(open.price);
                    }
                }
            }
            Side::SELL => {
                if let Some(level) = self.asks.level_mut(open.price) {
                    level.retire(open.remaining);
                    if level.is_exhausted() {
                        self.asks.remove_level(open.price);
                    }
                }
            }
        }

        debug!(order_id = %id, price = %open.price, "order cancelled");
        true
    }

    /// Replace a resting order's price and quantity
    ///
    /// Cancel-and-reinsert semantics: the replacement is admitted with a
    /// fresh sequence and loses time priority unconditionally, even when
    /// only the quantity changed. It may cross and execute immediately.
    /// A zero replacement quantity is treated as a cancel. Returns false
    /// and leaves state untouched when the id is unknown.
    pub fn modify(&mut self, id: OrderId, new_price: Price, new_quantity: Quantity) -> bool {
        let Some(open) = self.index.get(&id) else {
            debug!(order_id = %id, "modify for unknown order");
            return false;
        };
        let side = open.side;

        if new_quantity.is_zero() {
            return self.cancel(id);
        }

        self.cancel(id);
        let sequence = self.executor.next_sequence();
        debug!(order_id = %id, price = %new_price, quantity = %new_quantity, sequence, "order replaced");
        self.place_limit(id, side, new_price, new_quantity, sequence);
        true
    }

    /// Best bid price, if any bids rest
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_bid_price()
    }

    /// Best ask price, if any asks rest
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_ask_price()
    }

    /// Bid/ask spread in ticks when both sides are populated
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.ticks() - bid.ticks()),
            _ => None,
        }
    }

    /// Open quantity at a price level, if the level exists
    pub fn volume_at_price(&self, side: Side, price: Price) -> Option<Quantity> {
        match side {
            Side::BUY => self.bids.volume_at(price),
            Side::SELL => self.asks.volume_at(price),
        }
    }

    /// Number of live resting orders across both sides
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Remaining quantity of a resting order
    pub fn open_quantity(&self, id: OrderId) -> Option<Quantity> {
        self.index.get(&id).map(|open| open.remaining)
    }

    /// Chronological view of all executions
    pub fn trades(&self) -> &[Trade] {
        self.log.trades()
    }

    /// Executions with sequence >= the given value, for replay consumers
    pub fn trades_since(&self, sequence: u64) -> &[Trade] {
        self.log.since(sequence)
    }

    /// Hand the accumulated trade history to a sink, bounding memory
    pub fn drain_trades(&mut self) -> Vec<Trade> {
        self.log.drain()
    }

    /// Top-of-book snapshot down to `depth` levels per side
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
        }
    }

    /// Verify every structural invariant of the book
    ///
    /// Walks both side books and the order index: non-crossing best prices,
    /// per-level quantity caches, index/book membership equality, no dead
    /// levels, and trade log chronology. Intended for test harnesses and
    /// debug assertions; the cost is linear in the book size.
    pub fn check_invariants(&self) -> bool {
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return false;
            }
        }

        let mut live_total = 0;
        for (price, level) in self.bids.iter() {
            if !Self::level_consistent(&self.index, Side::BUY, *price, level) {
                return false;
            }
            live_total += level.live_orders();
        }
        for (price, level) in self.asks.iter() {
            if !Self::level_consistent(&self.index, Side::SELL, *price, level) {
                return false;
            }
            live_total += level.live_orders();
        }
        if live_total != self.index.len() {
            return false;
        }

        self.log
            .trades()
            .windows(2)
            .all(|pair| pair[0].sequence <= pair[1].sequence)
    }

    fn level_consistent(
        index: &OrderIndex,
        side: Side,
        price: Price,
        level: &PriceLevel,
    ) -> bool {
        if level.live_orders() == 0 {
            return false;
        }

        let mut live = 0;
        let mut total = Quantity::zero();
        for entry in level.queued_entries() {
            let Some(open) = index.get(&entry.id) else {
                continue; // tombstone
            };
            if open.sequence != entry.sequence {
                continue; // tombstone of a re-used id
            }
            if open.side != side || open.price != price {
                return false;
            }
            live += 1;
            total += open.remaining;
        }

        live == level.live_orders() && total == level.total_quantity()
    }

    /// Match a limit order, then rest any residual at its limit price
    fn place_limit(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
        sequence: u64,
    ) -> SubmitResult {
        let mut trades = Vec::new();
        let remaining = match side {
            Side::BUY => Self::sweep_asks(
                &mut self.asks,
                &mut self.index,
                &self.executor,
                id,
                Some(price),
                quantity,
                &mut trades,
            ),
            Side::SELL => Self::sweep_bids(
                &mut self.bids,
                &mut self.index,
                &self.executor,
                id,
                Some(price),
                quantity,
                &mut trades,
            ),
        };
        for trade in &trades {
            self.log.append(*trade);
        }

        if !remaining.is_zero() {
            match side {
                Side::BUY => self.bids.insert(price, id, sequence, remaining),
                Side::SELL => self.asks.insert(price, id, sequence, remaining),
            }
            self.index.insert(
                id,
                OpenOrder {
                    side,
                    price,
                    remaining,
                    sequence,
                },
            );
        }

        if remaining.is_zero() {
            SubmitResult::Filled { trades }
        } else if remaining < quantity {
            SubmitResult::PartiallyFilled { trades, remaining }
        } else {
            SubmitResult::Resting
        }
    }

    /// Match a market order; any residual is discarded, never rested
    fn place_market(&mut self, id: OrderId, side: Side, quantity: Quantity) -> SubmitResult {
        let mut trades = Vec::new();
        let remaining = match side {
            Side::BUY => Self::sweep_asks(
                &mut self.asks,
                &mut self.index,
                &self.executor,
                id,
                None,
                quantity,
                &mut trades,
            ),
            Side::SELL => Self::sweep_bids(
                &mut self.bids,
                &mut self.index,
                &self.executor,
                id,
                None,
                quantity,
                &mut trades,
            ),
        };
        for trade in &trades {
            self.log.append(*trade);
        }

        if remaining.is_zero() {
            SubmitResult::Filled { trades }
        } else {
            debug!(order_id = %id, remaining = %remaining, "market residual discarded");
            SubmitResult::PartiallyFilled { trades, remaining }
        }
    }

    /// Consume ask liquidity with a buy aggressor, best price first
    fn sweep_asks(
        asks: &mut AskBook,
        index: &mut OrderIndex,
        executor: &MatchExecutor,
        aggressor_id: OrderId,
        limit: Option<Price>,
        mut remaining: Quantity,
        trades: &mut Vec<Trade>,
    ) -> Quantity {
        while !remaining.is_zero() {
            let Some((level_price, level)) = asks.best_level_mut() else {
                break;
            };
            if !crossing::buy_crosses(limit, level_price) {
                break;
            }

            while !remaining.is_zero() {
                let Some(entry) = level.peek_front() else {
                    break;
                };
                let resting = match index.get_mut(&entry.id) {
                    Some(open) if open.sequence == entry.sequence => open,
                    _ => {
                        // cancelled admission still queued; drop the slot
                        level.discard_front();
                        continue;
                    }
                };

                let fill = remaining.min(resting.remaining);
                trades.push(executor.execute_trade(
                    aggressor_id,
                    Side::BUY,
                    entry.id,
                    level_price,
                    fill,
                ));
                trace!(
                    aggressor = %aggressor_id,
                    resting = %entry.id,
                    price = %level_price,
                    quantity = %fill,
                    "execution"
                );
                remaining -= fill;
                resting.remaining -= fill;

                if resting.remaining.is_zero() {
                    index.remove(&entry.id);
                    level.take_front(fill);
                } else {
                    level.fill_front(fill);
                }
            }

            if level.is_exhausted() {
                asks.remove_level(level_price);
            } else {
                break;
            }
        }

        remaining
    }

    /// Consume bid liquidity with a sell aggressor, best price first
    fn sweep_bids(
        bids: &mut BidBook,
        index: &mut OrderIndex,
        executor: &MatchExecutor,
        aggressor_id: OrderId,
        limit: Option<Price>,
        mut remaining: Quantity,
        trades: &mut Vec<Trade>,
    ) -> Quantity {
        while !remaining.is_zero() {
            let Some((level_price, level)) = bids.best_level_mut() else {
                break;
            };
            if !crossing::sell_crosses(limit, level_price) {
                break;
            }

            while !remaining.is_zero() {
                let Some(entry) = level.peek_front() else {
                    break;
                };
                let resting = match index.get_mut(&entry.id) {
                    Some(open) if open.sequence == entry.sequence => open,
                    _ => {
                        level.discard_front();
                        continue;
                    }
                };

                let fill = remaining.min(resting.remaining);
                trades.push(executor.execute_trade(
                    aggressor_id,
                    Side::SELL,
                    entry.id,
                    level_price,
                    fill,
                ));
                trace!(
                    aggressor = %aggressor_id,
                    resting = %entry.id,
                    price = %level_price,
                    quantity = %fill,
                    "execution"
                );
                remaining -= fill;
                resting.remaining -= fill;

                if resting.remaining.is_zero() {
                    index.remove(&entry.id);
                    level.take_front(fill);
                } else {
                    level.fill_front(fill);
                }
            }

            if level.is_exhausted() {
                bids.remove_level(level_price);
            } else {
                break;
            }
        }

        remaining
    }
}
