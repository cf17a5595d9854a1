use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use market::source::MarketDataSource;
use market::types::MarketSnapshot;
use workflow::model::{ExecutionRecord, RuleCounters, RuleId, RuleStatus, WorkflowRule};
use workflow::store::WorkflowStore;

/// In-memory store with failure injection and an optional gate that parks
/// `list_active_for_owner`, used to hold a pass open mid-flight.
#[derive(Default)]
pub struct MockStore {
    pub rules: Mutex<Vec<WorkflowRule>>,
    pub executions: Mutex<Vec<ExecutionRecord>>,
    pub insert_calls: AtomicUsize,
    pub fail_insert: AtomicBool,
    pub hold_list: AtomicBool,
    pub release: Notify,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_direct(&self, rule: WorkflowRule) {
        self.rules.lock().await.push(rule);
    }

    pub async fn get_rule(&self, rule_id: RuleId) -> Option<WorkflowRule> {
        self.rules
            .lock()
            .await
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
    }
}

#[async_trait]
impl WorkflowStore for MockStore {
    async fn list_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>> {
        Ok(self
            .rules
            .lock()
            .await
            .iter()
            .filter(|r| r.wallet_address == owner)
            .cloned()
            .collect())
    }

    async fn list_active_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>> {
        if self.hold_list.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        Ok(self
            .rules
            .lock()
            .await
            .iter()
            .filter(|r| r.wallet_address == owner && r.status == RuleStatus::Active)
            .cloned()
            .collect())
    }

    async fn save(&self, rule: &WorkflowRule) -> anyhow::Result<()> {
        let mut rules = self.rules.lock().await;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => rules.push(rule.clone()),
        }
        Ok(())
    }

    async fn delete(&self, rule_id: RuleId) -> anyhow::Result<()> {
        self.rules.lock().await.retain(|r| r.id != rule_id);
        Ok(())
    }

    async fn update_status(&self, rule_id: RuleId, status: RuleStatus) -> anyhow::Result<()> {
        let mut rules = self.rules.lock().await;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| anyhow::anyhow!("Rule not found"))?;

        rule.status = status;
        Ok(())
    }

    async fn update_counters(
        &self,
        rule_id: RuleId,
        counters: &RuleCounters,
    ) -> anyhow::Result<()> {
        let mut rules = self.rules.lock().await;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| anyhow::anyhow!("Rule not found"))?;

        rule.execution_count = counters.execution_count;
        rule.rewards_generated = counters.rewards_generated;
        rule.last_executed_at = Some(counters.last_executed_at);
        Ok(())
    }

    async fn insert_execution(&self, record: &ExecutionRecord) -> anyhow::Result<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_insert.load(Ordering::SeqCst) {
            anyhow::bail!("injected insert failure");
        }

        self.executions.lock().await.push(record.clone());
        Ok(())
    }

    async fn recent_executions(&self, limit: u32) -> anyhow::Result<Vec<ExecutionRecord>> {
        let executions = self.executions.lock().await;
        Ok(executions.iter().rev().take(limit as usize).cloned().collect())
    }
}

/// Market source replaying one programmed snapshot.
pub struct MockMarket {
    snapshot: MarketSnapshot,
}

impl MockMarket {
    pub fn new(snapshot: MarketSnapshot) -> Arc<Self> {
        Arc::new(Self { snapshot })
    }
}

impl MarketDataSource for MockMarket {
    fn snapshot(&self) -> MarketSnapshot {
        self.snapshot.clone()
    }
}
