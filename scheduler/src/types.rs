//! Shared types used by the client-side scheduler.

use std::time::Duration;

/// Configuration knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the periodic trigger runs while a session is connected.
    pub eval_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            eval_interval: Duration::from_secs(30),
        }
    }
}

/// Where the scheduler reads the owner's spendable balance from.
///
/// In the hosting app this is the connected wallet's token balance; the
/// demo and the tests plug in a fixed value.
pub trait BalanceSource: Send + Sync {
    fn current(&self, owner: &str) -> f64;
}

/// Constant balance, the demo default.
#[derive(Debug, Clone, Copy)]
pub struct FixedBalance(pub f64);

impl BalanceSource for FixedBalance {
    fn current(&self, _owner: &str) -> f64 {
        self.0
    }
}
