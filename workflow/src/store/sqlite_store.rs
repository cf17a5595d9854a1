//! SqliteWorkflowStore
//! --------------------
//! SQLite-backed implementation of the `WorkflowStore` trait. It is
//! responsible for durable persistence of rules and their audit trail so
//! that:
//!
//!  - rules survive restarts
//!  - firing counters accumulate across evaluation passes
//!  - every firing leaves one immutable execution row
//!  - engine + scheduler otherwise operate in-memory, via WorkflowManager

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use super::WorkflowStore;
use crate::model::{
    ActionKind, ExecutionOutcome, ExecutionRecord, RuleCounters, RuleId, RuleStatus, TriggerKind,
    TriggerOp, WorkflowRule,
};

/// SQLite persistence backend for workflow rules and execution records.
///
/// Provides:
///   - schema creation on startup
///   - owner-scoped rule listing
///   - upsert semantics (`save`)
///   - append-only execution log (`insert_execution`)
pub struct SqliteWorkflowStore {
    pool: SqlitePool,
}

impl SqliteWorkflowStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new SQLite-backed store and ensure schema exists.
    pub async fn new(path: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(path).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates tables if they do not exist.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                wallet_address TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,

                trigger_kind TEXT NOT NULL,
                trigger_op TEXT NOT NULL,
                trigger_value REAL NOT NULL,
                trigger_token TEXT,

                action_kind TEXT NOT NULL,
                action_amount REAL,
                action_recipient TEXT,
                action_token TEXT,

                tokens_staked REAL NOT NULL,
                rewards_generated REAL NOT NULL,
                execution_count INTEGER NOT NULL,
                last_executed_at TEXT,

                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_executions (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                executed_at TEXT NOT NULL,
                trigger_met TEXT NOT NULL,
                action_taken TEXT NOT NULL,
                result TEXT NOT NULL,
                rewards_earned REAL NOT NULL,
                transaction_hash TEXT,
                details TEXT
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn rule_from_row(row: &SqliteRow) -> anyhow::Result<WorkflowRule> {
        let id_str: String = row.get("id");
        let id = RuleId::parse_str(&id_str)?;

        let status_str: String = row.get("status");
        let status = RuleStatus::from_str(&status_str)
            .map_err(|e| anyhow::anyhow!("Invalid rule status '{}': {}", status_str, e))?;

        // Kind/op/action parses are infallible: unknown values survive as
        // Other(..) and evaluate as no-ops.
        let trigger_kind = row
            .get::<String, _>("trigger_kind")
            .parse::<TriggerKind>()
            .unwrap();
        let trigger_op = row
            .get::<String, _>("trigger_op")
            .parse::<TriggerOp>()
            .unwrap();
        let action_kind = row
            .get::<String, _>("action_kind")
            .parse::<ActionKind>()
            .unwrap();

        let last_executed_at = row
            .get::<Option<String>, _>("last_executed_at")
            .map(|s| parse_ts(&s))
            .transpose()?;
        let created_at = parse_ts(&row.get::<String, _>("created_at"))?;

        Ok(WorkflowRule {
            id,
            wallet_address: row.get("wallet_address"),
            name: row.get("name"),
            description: row.get("description"),
            trigger_kind,
            trigger_op,
            trigger_value: row.get("trigger_value"),
            trigger_token: row.get("trigger_token"),
            action_kind,
            action_amount: row.get("action_amount"),
            action_recipient: row.get("action_recipient"),
            action_token: row.get("action_token"),
            tokens_staked: row.get("tokens_staked"),
            rewards_generated: row.get("rewards_generated"),
            execution_count: row.get::<i64, _>("execution_count") as u64,
            last_executed_at,
            status,
            created_at,
        })
    }

    fn record_from_row(row: &SqliteRow) -> anyhow::Result<ExecutionRecord> {
        let id_str: String = row.get("id");
        let rule_id_str: String = row.get("workflow_id");

        let outcome_str: String = row.get("result");
        let outcome = ExecutionOutcome::from_str(&outcome_str)
            .map_err(|e| anyhow::anyhow!("Invalid execution result '{}': {}", outcome_str, e))?;

        let details = row
            .get::<Option<String>, _>("details")
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid execution details JSON: {}", e))?;

        Ok(ExecutionRecord {
            id: RuleId::parse_str(&id_str)?,
            rule_id: RuleId::parse_str(&rule_id_str)?,
            executed_at: parse_ts(&row.get::<String, _>("executed_at"))?,
            trigger_met: row.get("trigger_met"),
            action_taken: row.get("action_taken"),
            outcome,
            rewards_earned: row.get("rewards_earned"),
            transaction_hash: row.get("transaction_hash"),
            details,
        })
    }
}

fn parse_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| anyhow::anyhow!("Invalid timestamp '{}': {}", s, e))?
        .with_timezone(&Utc))
}

#[async_trait]
impl WorkflowStore for SqliteWorkflowStore {
    async fn list_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>> {
        let rows = sqlx::query(
            "SELECT * FROM workflows WHERE wallet_address = ? ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::rule_from_row).collect()
    }

    async fn list_active_for_owner(&self, owner: &str) -> anyhow::Result<Vec<WorkflowRule>> {
        let rows = sqlx::query(
            "SELECT * FROM workflows WHERE wallet_address = ? AND status = 'active' \
             ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::rule_from_row).collect()
    }

    /// Store or update a rule.
    ///
    /// `save()` uses INSERT OR UPDATE semantics:
    /// - New rule → inserted
    /// - Existing rule → updated
    async fn save(&self, rule: &WorkflowRule) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO workflows (
                id, wallet_address, name, description,
                trigger_kind, trigger_op, trigger_value, trigger_token,
                action_kind, action_amount, action_recipient, action_token,
                tokens_staked, rewards_generated, execution_count,
                last_executed_at, status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                wallet_address = excluded.wallet_address,
                name = excluded.name,
                description = excluded.description,
                trigger_kind = excluded.trigger_kind,
                trigger_op = excluded.trigger_op,
                trigger_value = excluded.trigger_value,
                trigger_token = excluded.trigger_token,
                action_kind = excluded.action_kind,
                action_amount = excluded.action_amount,
                action_recipient = excluded.action_recipient,
                action_token = excluded.action_token,
                tokens_staked = excluded.tokens_staked,
                rewards_generated = excluded.rewards_generated,
                execution_count = excluded.execution_count,
                last_executed_at = excluded.last_executed_at,
                status = excluded.status,
                created_at = excluded.created_at;
        "#,
        )
        .bind(rule.id.to_string())
        .bind(&rule.wallet_address)
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(rule.trigger_kind.to_string())
        .bind(rule.trigger_op.to_string())
        .bind(rule.trigger_value)
        .bind(&rule.trigger_token)
        .bind(rule.action_kind.to_string())
        .bind(rule.action_amount)
        .bind(&rule.action_recipient)
        .bind(&rule.action_token)
        .bind(rule.tokens_staked)
        .bind(rule.rewards_generated)
        .bind(rule.execution_count as i64)
        .bind(rule.last_executed_at.map(|t| t.to_rfc3339()))
        .bind(rule.status.to_string())
        .bind(rule.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, rule_id: RuleId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(rule_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_status(&self, rule_id: RuleId, status: RuleStatus) -> anyhow::Result<()> {
        sqlx::query("UPDATE workflows SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(rule_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_counters(
        &self,
        rule_id: RuleId,
        counters: &RuleCounters,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE workflows SET execution_count = ?, rewards_generated = ?, \
             last_executed_at = ? WHERE id = ?",
        )
        .bind(counters.execution_count as i64)
        .bind(counters.rewards_generated)
        .bind(counters.last_executed_at.to_rfc3339())
        .bind(rule_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_execution(&self, record: &ExecutionRecord) -> anyhow::Result<()> {
        let details = record
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO workflow_executions (
                id, workflow_id, executed_at,
                trigger_met, action_taken, result,
                rewards_earned, transaction_hash, details
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
        "#,
        )
        .bind(record.id.to_string())
        .bind(record.rule_id.to_string())
        .bind(record.executed_at.to_rfc3339())
        .bind(&record.trigger_met)
        .bind(&record.action_taken)
        .bind(record.outcome.to_string())
        .bind(record.rewards_earned)
        .bind(&record.transaction_hash)
        .bind(details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_executions(&self, limit: u32) -> anyhow::Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM workflow_executions ORDER BY executed_at DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::record_from_row).collect()
    }
}
