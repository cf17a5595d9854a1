//! Reward computation: fixed per-action-kind rate × action amount.
//
//  Total function: missing or nonsense amounts count as zero, unknown
//  kinds earn nothing. Never negative.

use workflow::model::ActionKind;

/// Reward earned by firing an action of `kind` over `amount` tokens.
pub fn reward_for(kind: &ActionKind, amount: Option<f64>) -> f64 {
    let amount = match amount {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    };

    amount * kind.reward_rate()
}
