//! Simulated market data source.
//!
//! Produces one [`MarketSnapshot`] per call: fixed base prices with bounded
//! uniform jitter, plus synthetic network counters. In a real deployment
//! this seam would be backed by oracles/APIs; the demo keeps it synthetic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::random::RandomSource;
use crate::types::MarketSnapshot;

/// Simulated tokens: (symbol, base price, jitter half-width).
///
/// Each sampled price lands in `base ± jitter`.
pub const BASE_PRICES: [(&str, f64, f64); 4] = [
    ("RLO", 2.45, 0.25),
    ("STK", 0.85, 0.10),
    ("RWD", 1.20, 0.15),
    ("ETH", 2500.0, 100.0),
];

pub const NETWORK_ACTIVITY_MIN: u32 = 50;
pub const NETWORK_ACTIVITY_MAX: u32 = 150;
pub const NEW_USERS_MAX: u32 = 20;
pub const TRANSACTION_COUNT_MIN: u32 = 100;
pub const TRANSACTION_COUNT_MAX: u32 = 600;

/// Anything that can hand out a market snapshot.
pub trait MarketDataSource: Send + Sync {
    fn snapshot(&self) -> MarketSnapshot;
}

/// The demo market simulator.
///
/// Draw order per snapshot is part of the contract for deterministic tests:
/// one draw per token in [`BASE_PRICES`] order, then network activity,
/// new users, transaction count.
pub struct SimulatedMarket {
    rng: Arc<dyn RandomSource>,
}

impl SimulatedMarket {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

impl MarketDataSource for SimulatedMarket {
    fn snapshot(&self) -> MarketSnapshot {
        let mut token_prices = HashMap::with_capacity(BASE_PRICES.len());

        for (symbol, base, jitter) in BASE_PRICES {
            let offset = (self.rng.unit() - 0.5) * 2.0 * jitter;
            token_prices.insert(symbol.to_string(), base + offset);
        }

        let activity_span = NETWORK_ACTIVITY_MAX - NETWORK_ACTIVITY_MIN;
        let network_activity =
            NETWORK_ACTIVITY_MIN + (self.rng.unit() * f64::from(activity_span)) as u32;

        let new_users = (self.rng.unit() * f64::from(NEW_USERS_MAX)) as u32;

        let tx_span = TRANSACTION_COUNT_MAX - TRANSACTION_COUNT_MIN;
        let transaction_count =
            TRANSACTION_COUNT_MIN + (self.rng.unit() * f64::from(tx_span)) as u32;

        MarketSnapshot {
            token_prices,
            network_activity,
            new_users,
            transaction_count,
        }
    }
}
