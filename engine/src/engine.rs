//! The workflow evaluation engine.
//!
//! For each evaluation pass (one owner wallet), it:
//!   1. Loads the owner's active rules from the store.
//!   2. Takes a single market snapshot shared by every rule in the pass.
//!   3. Checks each rule's trigger with `condition::fires`.
//!   4. For every firing: computes the reward, appends an execution record,
//!      advances the rule's counters, and collects a result entry.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::condition;
use crate::reward;
use crate::types::{EngineError, EvaluationOutput, EvaluationResult};
use market::random::RandomSource;
use market::source::MarketDataSource;
use market::types::MarketSnapshot;
use workflow::model::{ExecutionOutcome, ExecutionRecord, RuleCounters, WorkflowRule};
use workflow::store::WorkflowStore;

pub struct EvaluationEngine<S: WorkflowStore> {
    store: Arc<S>,
    market: Arc<dyn MarketDataSource>,
    rng: Arc<dyn RandomSource>,
}

impl<S: WorkflowStore> EvaluationEngine<S> {
    pub fn new(
        store: Arc<S>,
        market: Arc<dyn MarketDataSource>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self { store, market, rng }
    }

    /// Run one evaluation pass for `owner`.
    ///
    /// Weak consistency across rules is part of the contract: a store
    /// failure aborts the pass, but records and counters already written
    /// for earlier rules in the same pass stay committed. Same-owner calls
    /// must be serialized by the caller; the engine holds no cross-call
    /// lock of its own.
    pub async fn evaluate(
        &self,
        owner: &str,
        balance: f64,
    ) -> Result<EvaluationOutput, EngineError> {
        if owner.trim().is_empty() {
            return Err(EngineError::MissingOwner);
        }

        let rules = self
            .store
            .list_active_for_owner(owner)
            .await
            .map_err(EngineError::Store)?;

        // One snapshot for the whole pass, so every rule sees the same market.
        let snapshot = self.market.snapshot();

        tracing::debug!(
            owner,
            active_rules = rules.len(),
            network_activity = snapshot.network_activity,
            "evaluation pass started"
        );

        let mut results = Vec::new();

        for rule in &rules {
            if !condition::fires(rule, &snapshot, balance, self.rng.as_ref()) {
                continue;
            }

            let reward = reward::reward_for(&rule.action_kind, rule.action_amount);
            self.commit_firing(rule, reward, &snapshot).await?;

            tracing::info!(
                owner,
                rule = %rule.name,
                action = %rule.action_kind,
                reward,
                "workflow fired"
            );

            results.push(EvaluationResult {
                rule_id: rule.id,
                name: rule.name.clone(),
                executed: true,
                reward,
                action: rule.action_kind.to_string(),
            });
        }

        Ok(EvaluationOutput {
            results,
            market: snapshot,
        })
    }

    /// Persist one firing: append the audit record, then advance counters.
    async fn commit_firing(
        &self,
        rule: &WorkflowRule,
        reward: f64,
        snapshot: &MarketSnapshot,
    ) -> Result<(), EngineError> {
        let now = Utc::now();

        let record = ExecutionRecord {
            id: Uuid::new_v4(),
            rule_id: rule.id,
            executed_at: now,
            trigger_met: rule.trigger_summary(),
            action_taken: rule.action_summary(),
            outcome: ExecutionOutcome::Success,
            rewards_earned: reward,
            transaction_hash: None,
            details: serde_json::to_value(snapshot).ok(),
        };

        self.store
            .insert_execution(&record)
            .await
            .map_err(EngineError::Store)?;

        let counters = RuleCounters {
            execution_count: rule.execution_count + 1,
            rewards_generated: rule.rewards_generated + reward,
            last_executed_at: now,
        };

        self.store
            .update_counters(rule.id, &counters)
            .await
            .map_err(EngineError::Store)?;

        Ok(())
    }
}
