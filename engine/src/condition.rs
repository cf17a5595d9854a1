//! Determines whether a single rule's trigger fires against one market
//! snapshot and the owner's balance.
//
//  Deliberately total: unknown kinds and operators evaluate to false,
//  never to an error, so one malformed rule cannot block the pass.

use market::random::RandomSource;
use market::types::MarketSnapshot;
use workflow::model::{DEFAULT_TOKEN, TriggerKind, TriggerOp, WorkflowRule};

/// Chance that a `time_interval` trigger fires on any given pass.
///
/// The demo keeps the original's probabilistic placeholder instead of a
/// deterministic elapsed-interval check; the draw goes through the injected
/// `rng` so tests can pin the outcome.
pub const TIME_INTERVAL_FIRE_PROBABILITY: f64 = 0.3;

/// Absolute tolerance for the `equals` price comparison.
pub const EQUALS_TOLERANCE: f64 = 0.01;

/// Check whether `rule`'s trigger condition holds.
///
/// Pure over its inputs; the only randomness is the injected draw used by
/// `time_interval`.
pub fn fires(
    rule: &WorkflowRule,
    snapshot: &MarketSnapshot,
    balance: f64,
    rng: &dyn RandomSource,
) -> bool {
    match &rule.trigger_kind {
        TriggerKind::PriceThreshold => {
            let token = rule.trigger_token.as_deref().unwrap_or(DEFAULT_TOKEN);
            let price = snapshot.price(token).unwrap_or(0.0);

            match rule.trigger_op {
                TriggerOp::Above => price > rule.trigger_value,
                TriggerOp::Below => price < rule.trigger_value,
                TriggerOp::Equals => (price - rule.trigger_value).abs() < EQUALS_TOLERANCE,
                _ => false,
            }
        }
        TriggerKind::BalanceThreshold => match rule.trigger_op {
            TriggerOp::Above => balance > rule.trigger_value,
            TriggerOp::Below => balance < rule.trigger_value,
            _ => false,
        },
        TriggerKind::NetworkActivity => {
            let activity = f64::from(snapshot.network_activity);

            match rule.trigger_op {
                TriggerOp::Above => activity > rule.trigger_value,
                TriggerOp::Below => activity < rule.trigger_value,
                _ => false,
            }
        }
        // Operator is ignored for onboarding triggers.
        TriggerKind::UserOnboarding => f64::from(snapshot.new_users) >= rule.trigger_value,
        TriggerKind::TransactionCount => match rule.trigger_op {
            TriggerOp::Above => f64::from(snapshot.transaction_count) > rule.trigger_value,
            _ => false,
        },
        TriggerKind::TimeInterval => rng.unit() < TIME_INTERVAL_FIRE_PROBABILITY,
        TriggerKind::Other(_) => false,
    }
}
