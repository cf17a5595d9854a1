use std::collections::HashMap;

use serde::Serialize;

/// One simulated market/network sample.
///
/// Snapshots are ephemeral: they carry no identity and are regenerated on
/// every evaluation pass. Callers that want an audit trail attach the
/// serialized snapshot to the execution record they write.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    /// Token symbol -> simulated spot price.
    pub token_prices: HashMap<String, f64>,

    /// Synthetic network-activity score, in [50, 150).
    pub network_activity: u32,

    /// Newly onboarded users this sample, in [0, 20).
    pub new_users: u32,

    /// Transactions this sample, in [100, 600).
    pub transaction_count: u32,
}

impl MarketSnapshot {
    /// Price for `symbol`, or `None` when the symbol is not simulated.
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.token_prices.get(symbol).copied()
    }
}
