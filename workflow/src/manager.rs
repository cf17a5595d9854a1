use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::model::{
    ActionKind, NewRule, RuleId, RuleStatus, TriggerKind, TriggerOp, WorkflowRule,
};
use crate::store::WorkflowStore;

/// Change notification from the store's best-effort realtime feed.
///
/// Not required for evaluation correctness; only keeps the cached
/// projection fresh when another client touches the same wallet's rules.
#[derive(Debug, Clone)]
pub enum RuleChange {
    Inserted(WorkflowRule),
    Updated(WorkflowRule),
    Deleted(RuleId),
}

/// Manages the in-memory live set of rules and persists changes to a store.
///
/// The cache is a read-mostly projection. The store stays authoritative:
/// every mutation goes through it, and a store failure rolls the cache back.
pub struct WorkflowManager<S: WorkflowStore> {
    rules: Arc<Mutex<HashMap<RuleId, WorkflowRule>>>,
    by_owner: Arc<Mutex<HashMap<String, Vec<RuleId>>>>,
    store: Arc<S>,
}

impl<S: WorkflowStore> WorkflowManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            rules: Arc::new(Mutex::new(HashMap::new())),
            by_owner: Arc::new(Mutex::new(HashMap::new())),
            store,
        }
    }

    /// Load a wallet's rules into the cache, seeding the default set the
    /// first time a wallet shows up with zero rules.
    pub async fn load_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>> {
        let mut loaded = self.store.list_for_owner(owner).await?;

        if loaded.is_empty() {
            loaded = self.seed_defaults(owner).await?;
        }

        {
            let mut rules = self.rules.lock().await;
            let mut idx = self.by_owner.lock().await;
            let ids = idx.entry(owner.to_string()).or_default();

            for rule in &loaded {
                if !ids.contains(&rule.id) {
                    ids.push(rule.id);
                }
                rules.insert(rule.id, rule.clone());
            }
        }

        Ok(loaded)
    }

    async fn seed_defaults(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>> {
        let mut seeded = Vec::new();

        for template in default_rules() {
            let rule = template.into_rule(owner);
            self.store.save(&rule).await?;
            seeded.push(rule);
        }

        tracing::info!(owner, count = seeded.len(), "seeded default workflows");
        Ok(seeded)
    }

    /// Create a new rule, store it, and index it.
    pub async fn create_rule(&self, owner: &str, spec: NewRule) -> anyhow::Result<RuleId> {
        let rule = spec.into_rule(owner);
        let id = rule.id;

        self.store.save(&rule).await?;

        {
            let mut rules = self.rules.lock().await;
            rules.insert(id, rule.clone());
        }

        {
            let mut idx = self.by_owner.lock().await;
            idx.entry(rule.wallet_address.clone()).or_default().push(id);
        }

        Ok(id)
    }

    /// Toggle a rule between active and paused.
    ///
    /// Optimistic: the cache is updated first so the UI reflects the toggle
    /// immediately, then the store write happens; on failure the cached
    /// status is restored as an explicit compensating action.
    ///
    /// The write is status-only. The engine commits firing counters straight
    /// to the store before the cache ever hears about them, so a full-row
    /// save here could move `execution_count` backwards.
    pub async fn set_status(&self, rule_id: RuleId, status: RuleStatus) -> anyhow::Result<()> {
        let previous_status = {
            let mut rules = self.rules.lock().await;
            let rule = rules
                .get_mut(&rule_id)
                .ok_or_else(|| anyhow::anyhow!("Rule not found"))?;

            let previous = rule.status;
            rule.status = status;
            previous
        };

        if let Err(e) = self.store.update_status(rule_id, status).await {
            // Compensate: restore what the UI saw before the failed write.
            let mut rules = self.rules.lock().await;
            if let Some(rule) = rules.get_mut(&rule_id) {
                rule.status = previous_status;
            }
            return Err(e);
        }

        Ok(())
    }

    /// Delete a rule from the store, then the cache and index.
    pub async fn delete_rule(&self, rule_id: RuleId) -> anyhow::Result<()> {
        self.store.delete(rule_id).await?;

        let removed = {
            let mut rules = self.rules.lock().await;
            rules.remove(&rule_id)
        };

        if let Some(rule) = removed {
            let mut idx = self.by_owner.lock().await;
            if let Some(ids) = idx.get_mut(&rule.wallet_address) {
                ids.retain(|rid| *rid != rule_id);
            }
        }

        Ok(())
    }

    /// Merge one firing reported by the evaluation engine into the cache.
    ///
    /// Counters advance; `status` is deliberately left alone so a concurrent
    /// local pause/resume is not clobbered. The store was already updated by
    /// the engine itself.
    pub async fn record_firing(&self, rule_id: RuleId, reward: f64, now: DateTime<Utc>) {
        let mut rules = self.rules.lock().await;

        if let Some(rule) = rules.get_mut(&rule_id) {
            rule.execution_count += 1;
            rule.rewards_generated += reward;
            rule.last_executed_at = Some(now);
        }
    }

    /// Reconcile one realtime change into the cache.
    ///
    /// Inserts for other owners and duplicate inserts are ignored. Updates
    /// only apply to rules the cache already knows, so a remote update
    /// cannot resurrect a locally deleted rule.
    pub async fn apply_change(&self, owner: &str, change: RuleChange) {
        match change {
            RuleChange::Inserted(rule) => {
                if rule.wallet_address != owner {
                    return;
                }

                let mut rules = self.rules.lock().await;
                if rules.contains_key(&rule.id) {
                    return;
                }

                let mut idx = self.by_owner.lock().await;
                idx.entry(rule.wallet_address.clone())
                    .or_default()
                    .push(rule.id);
                rules.insert(rule.id, rule);
            }
            RuleChange::Updated(rule) => {
                if rule.wallet_address != owner {
                    return;
                }

                let mut rules = self.rules.lock().await;
                if let Some(existing) = rules.get_mut(&rule.id) {
                    *existing = rule;
                }
            }
            RuleChange::Deleted(rule_id) => {
                let mut rules = self.rules.lock().await;
                if let Some(rule) = rules.remove(&rule_id) {
                    let mut idx = self.by_owner.lock().await;
                    if let Some(ids) = idx.get_mut(&rule.wallet_address) {
                        ids.retain(|rid| *rid != rule_id);
                    }
                }
            }
        }
    }

    /// Cached rules for an owner, in index order.
    pub async fn rules_for_owner(&self, owner: &str) -> Vec<WorkflowRule> {
        let ids_opt = {
            let idx = self.by_owner.lock().await;
            idx.get(owner).cloned()
        };

        let Some(ids) = ids_opt else { return vec![] };

        let rules = self.rules.lock().await;
        ids.into_iter()
            .filter_map(|rid| rules.get(&rid).cloned())
            .collect()
    }

    /// Helper to fetch a single cached rule.
    pub async fn get_rule(&self, id: RuleId) -> Option<WorkflowRule> {
        let rules = self.rules.lock().await;
        rules.get(&id).cloned()
    }
}

/// The fixed starter set a fresh wallet gets.
fn default_rules() -> Vec<NewRule> {
    vec![
        NewRule {
            name: "Auto-Stake Rewards".into(),
            description: Some("Automatically stake RLO when balance exceeds threshold".into()),
            trigger_kind: TriggerKind::BalanceThreshold,
            trigger_op: TriggerOp::Above,
            trigger_value: 1000.0,
            trigger_token: Some("RLO".into()),
            action_kind: ActionKind::Stake,
            action_amount: Some(100.0),
            action_recipient: None,
            action_token: Some("RLO".into()),
            tokens_staked: 1500.0,
        },
        NewRule {
            name: "Price Alert Buy".into(),
            description: Some("Buy RLO when price drops below target".into()),
            trigger_kind: TriggerKind::PriceThreshold,
            trigger_op: TriggerOp::Below,
            trigger_value: 2.0,
            trigger_token: Some("RLO".into()),
            action_kind: ActionKind::Swap,
            action_amount: Some(100.0),
            action_recipient: None,
            action_token: Some("RLO".into()),
            tokens_staked: 2000.0,
        },
        NewRule {
            name: "Network Activity Bridge".into(),
            description: Some("Bridge tokens when network activity is high".into()),
            trigger_kind: TriggerKind::NetworkActivity,
            trigger_op: TriggerOp::Above,
            trigger_value: 80.0,
            trigger_token: None,
            action_kind: ActionKind::Bridge,
            action_amount: Some(500.0),
            action_recipient: None,
            action_token: Some("RLO".into()),
            tokens_staked: 3500.0,
        },
    ]
}
