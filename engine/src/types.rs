//! Shared types used by the evaluation engine.

use serde::Serialize;
use thiserror::Error;

use market::types::MarketSnapshot;
use workflow::model::RuleId;

/// One fired rule within an evaluation pass.
///
/// Non-firing rules never appear in results; absence means "did not fire".
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub rule_id: RuleId,
    pub name: String,
    /// Always true for entries present in results; kept so the wire shape
    /// the hosting UI consumes stays explicit.
    pub executed: bool,
    pub reward: f64,
    pub action: String,
}

/// Outcome of one full evaluation pass: every firing plus the snapshot that
/// drove the decisions, so the caller can show what the pass saw.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutput {
    pub results: Vec<EvaluationResult>,
    pub market: MarketSnapshot,
}

/// Errors the engine surfaces to its caller.
///
/// Logic errors do not exist by construction: unknown trigger/action kinds
/// evaluate as "does not fire" / zero reward rather than failing the pass.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected before any store access; no side effects have happened.
    #[error("missing owner wallet address")]
    MissingOwner,

    /// A store read/write failed. Per-rule writes from earlier in the same
    /// pass stay committed (at-least-once across rules, no rollback).
    #[error("workflow store error: {0}")]
    Store(#[source] anyhow::Error),
}
