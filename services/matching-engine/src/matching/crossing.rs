//! Crossing detection logic
//!
//! Determines when an aggressor can trade against a resting price. A market
//! aggressor carries no limit and crosses everything.

use types::numeric::Price;

/// Check if a buy aggressor can trade at the given ask price
pub fn buy_crosses(limit: Option<Price>, ask_price: Price) -> bool {
    limit.map_or(true, |price| price >= ask_price)
}

/// Check if a sell aggressor can trade at the given bid price
pub fn sell_crosses(limit: Option<Price>, bid_price: Price) -> bool {
    limit.map_or(true, |price| price <= bid_price)
}
