//! Property-based tests over random intent streams
//!
//! Every structural invariant of the book must hold after every operation,
//! for any interleaving of limit, market, cancel, and modify intents.

use std::collections::HashMap;

use proptest::prelude::*;

use matching_engine::{MatchingEngine, SubmitResult};
use types::prelude::*;

/// One step of a random intent stream
///
/// Liquidity intents take their id from the stream position, so ids are
/// unique and self-trading cannot blur the conservation ledger. Control
/// intents aim at earlier positions and may hit live, filled, or unknown
/// orders alike.
#[derive(Debug, Clone)]
enum Action {
    Limit { side: Side, price: i64, quantity: u64 },
    Market { side: Side, quantity: u64 },
    Cancel { target: u64 },
    Modify { target: u64, price: i64, quantity: u64 },
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::BUY), Just(Side::SELL)]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        5 => (side_strategy(), 9_990i64..=10_010, 1u64..=100)
            .prop_map(|(side, price, quantity)| Action::Limit { side, price, quantity }),
        1 => (side_strategy(), 1u64..=150)
            .prop_map(|(side, quantity)| Action::Market { side, quantity }),
        2 => (0u64..60).prop_map(|target| Action::Cancel { target }),
        2 => (0u64..60, 9_990i64..=10_010, 0u64..=100)
            .prop_map(|(target, price, quantity)| Action::Modify { target, price, quantity }),
    ]
}

fn filled_quantity(engine: &MatchingEngine, id: OrderId) -> u64 {
    engine
        .trades()
        .iter()
        .filter(|trade| trade.involves(id))
        .map(|trade| trade.quantity.units())
        .sum()
}

fn apply(engine: &mut MatchingEngine, position: u64, action: &Action) -> Option<SubmitResult> {
    match action {
        Action::Limit { side, price, quantity } => Some(
            engine
                .submit(Order::limit(
                    OrderId::new(position),
                    *side,
                    Price::new(*price),
                    Quantity::new(*quantity),
                ))
                .expect("unique id and positive quantity"),
        ),
        Action::Market { side, quantity } => Some(
            engine
                .submit(Order::market(
                    OrderId::new(position),
                    *side,
                    Quantity::new(*quantity),
                ))
                .expect("positive quantity"),
        ),
        Action::Cancel { target } => {
            engine.cancel(OrderId::new(*target));
            None
        }
        Action::Modify { target, price, quantity } => {
            engine.modify(
                OrderId::new(*target),
                Price::new(*price),
                Quantity::new(*quantity),
            );
            None
        }
    }
}

proptest! {
    /// Structural invariants survive any intent stream; submitted limit
    /// quantity is always accounted for by fills plus residual.
    #[test]
    fn invariants_hold_across_random_streams(actions in prop::collection::vec(action_strategy(), 1..80)) {
        let mut engine = MatchingEngine::new();

        for (position, action) in actions.iter().enumerate() {
            let result = apply(&mut engine, position as u64, action);
            prop_assert!(engine.check_invariants());

            match (action, result) {
                (Action::Limit { side, price, quantity }, Some(result)) => {
                    let (traded, residual) = match &result {
                        SubmitResult::Resting => (Quantity::zero(), Quantity::new(*quantity)),
                        SubmitResult::Filled { trades } => {
                            (trades.iter().map(|t| t.quantity).sum(), Quantity::zero())
                        }
                        SubmitResult::PartiallyFilled { trades, remaining } => {
                            (trades.iter().map(|t| t.quantity).sum(), *remaining)
                        }
                        SubmitResult::Control { .. } => unreachable!("limit intent"),
                    };
                    prop_assert_eq!(traded + residual, Quantity::new(*quantity));

                    // Price improvement only: a buy never pays above its
                    // limit, a sell never receives below it.
                    if let SubmitResult::Filled { trades } | SubmitResult::PartiallyFilled { trades, .. } = result {
                        for trade in trades {
                            match side {
                                Side::BUY => prop_assert!(trade.price <= Price::new(*price)),
                                Side::SELL => prop_assert!(trade.price >= Price::new(*price)),
                            }
                        }
                    }
                }
                (Action::Market { quantity, .. }, Some(result)) => {
                    let (traded, residual) = match &result {
                        SubmitResult::Filled { trades } => {
                            (trades.iter().map(|t| t.quantity).sum::<Quantity>(), Quantity::zero())
                        }
                        SubmitResult::PartiallyFilled { trades, remaining } => {
                            (trades.iter().map(|t| t.quantity).sum::<Quantity>(), *remaining)
                        }
                        _ => unreachable!("market intent"),
                    };
                    prop_assert_eq!(traded + residual, Quantity::new(*quantity));
                }
                _ => {}
            }
        }
    }

    /// Conservation: for every tracked order, admitted quantity equals
    /// fills since admission plus what still rests.
    #[test]
    fn quantity_is_conserved(actions in prop::collection::vec(action_strategy(), 1..80)) {
        let mut engine = MatchingEngine::new();
        // id -> (admitted quantity, fills recorded before admission)
        let mut ledger: HashMap<u64, (u64, u64)> = HashMap::new();

        for (position, action) in actions.iter().enumerate() {
            let position = position as u64;
            match action {
                Action::Cancel { target } => {
                    if engine.cancel(OrderId::new(*target)) {
                        ledger.remove(target);
                    }
                }
                Action::Modify { target, price, quantity } => {
                    let baseline = filled_quantity(&engine, OrderId::new(*target));
                    if engine.modify(OrderId::new(*target), Price::new(*price), Quantity::new(*quantity)) {
                        if *quantity == 0 {
                            ledger.remove(target);
                        } else {
                            ledger.insert(*target, (*quantity, baseline));
                        }
                    }
                }
                Action::Limit { .. } | Action::Market { .. } => {
                    apply(&mut engine, position, action);
                    if let Action::Limit { quantity, .. } = action {
                        ledger.insert(position, (*quantity, 0));
                    }
                }
            }
        }

        for (&id, &(admitted, baseline)) in &ledger {
            let id = OrderId::new(id);
            let filled = filled_quantity(&engine, id) - baseline;
            let open = engine.open_quantity(id).map_or(0, |q| q.units());
            prop_assert_eq!(admitted, filled + open);
        }
    }

    /// Adding a non-crossing limit and cancelling it restores every
    /// observable of the book.
    #[test]
    fn cancel_round_trip_is_invisible(
        setup in prop::collection::vec(action_strategy(), 0..40),
        side in side_strategy(),
        quantity in 1u64..=100,
    ) {
        let mut engine = MatchingEngine::new();
        for (position, action) in setup.iter().enumerate() {
            apply(&mut engine, position as u64, action);
        }

        // Far enough from the 9990..=10010 band to never cross
        let price = match side {
            Side::BUY => Price::new(9_000),
            Side::SELL => Price::new(11_000),
        };
        let id = OrderId::new(1_000_000);

        let best_bid = engine.best_bid();
        let best_ask = engine.best_ask();
        let order_count = engine.order_count();
        let volume = engine.volume_at_price(side, price);
        let trade_count = engine.trades().len();

        let result = engine.submit(Order::limit(id, side, price, Quantity::new(quantity))).unwrap();
        prop_assert_eq!(result, SubmitResult::Resting);
        prop_assert!(engine.cancel(id));

        prop_assert_eq!(engine.best_bid(), best_bid);
        prop_assert_eq!(engine.best_ask(), best_ask);
        prop_assert_eq!(engine.order_count(), order_count);
        prop_assert_eq!(engine.volume_at_price(side, price), volume);
        prop_assert_eq!(engine.trades().len(), trade_count);
        prop_assert!(engine.check_invariants());
    }

    /// Cancelling an id the book has never seen perturbs nothing.
    #[test]
    fn unknown_cancel_is_idempotent(setup in prop::collection::vec(action_strategy(), 0..40)) {
        let mut engine = MatchingEngine::new();
        for (position, action) in setup.iter().enumerate() {
            apply(&mut engine, position as u64, action);
        }

        let before = engine.snapshot(usize::MAX);
        let order_count = engine.order_count();
        let trade_count = engine.trades().len();

        prop_assert!(!engine.cancel(OrderId::new(1_000_000)));

        prop_assert_eq!(engine.snapshot(usize::MAX), before);
        prop_assert_eq!(engine.order_count(), order_count);
        prop_assert_eq!(engine.trades().len(), trade_count);
    }

    /// Same intents, same trades, same book: the engine is deterministic.
    #[test]
    fn replay_is_deterministic(actions in prop::collection::vec(action_strategy(), 1..60)) {
        let mut first = MatchingEngine::new();
        let mut second = MatchingEngine::new();

        for (position, action) in actions.iter().enumerate() {
            apply(&mut first, position as u64, action);
        }
        for (position, action) in actions.iter().enumerate() {
            apply(&mut second, position as u64, action);
        }

        prop_assert_eq!(first.trades(), second.trades());
        prop_assert_eq!(first.snapshot(usize::MAX), second.snapshot(usize::MAX));
        prop_assert_eq!(first.order_count(), second.order_count());
    }
}
