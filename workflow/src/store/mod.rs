pub mod sqlite_store;

use crate::model::{ExecutionRecord, RuleCounters, RuleId, RuleStatus, WorkflowRule};

/// Narrow persistence contract the engine and manager operate against.
///
/// The store is the single source of truth; the in-memory cache held by
/// [`crate::manager::WorkflowManager`] is a projection of it.
#[async_trait::async_trait]
pub trait WorkflowStore: Send + Sync {
    /// All rules owned by `owner`, newest first.
    async fn list_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>>;

    /// Rules owned by `owner` with status `active`, newest first.
    async fn list_active_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>>;

    /// Insert-or-update a rule.
    async fn save(&self, rule: &WorkflowRule) -> anyhow::Result<()>;

    /// Permanently remove a rule.
    async fn delete(&self, rule_id: RuleId) -> anyhow::Result<()>;

    /// Flip a rule's status, touching no other column. Kept separate from
    /// [`save`] so a toggle can never clobber counters the engine advanced
    /// since the caller's copy was read.
    ///
    /// [`save`]: WorkflowStore::save
    async fn update_status(&self, rule_id: RuleId, status: RuleStatus) -> anyhow::Result<()>;

    /// Advance a rule's firing counters. Never moves them backwards.
    async fn update_counters(&self, rule_id: RuleId, counters: &RuleCounters)
    -> anyhow::Result<()>;

    /// Append one immutable execution record.
    async fn insert_execution(&self, record: &ExecutionRecord) -> anyhow::Result<()>;

    /// Most recent execution records across all rules, newest first.
    async fn recent_executions(&self, limit: u32) -> anyhow::Result<Vec<ExecutionRecord>>;
}
