use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub type RuleId = Uuid;
pub type RecordId = Uuid;

/// Token a trigger reads when the rule does not name one.
pub const DEFAULT_TOKEN: &str = "RLO";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Active,
    Paused,
    Completed,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleStatus::Active => "active",
            RuleStatus::Paused => "paused",
            RuleStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for RuleStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RuleStatus::Active),
            "paused" => Ok(RuleStatus::Paused),
            "completed" => Ok(RuleStatus::Completed),
            other => Err(anyhow::anyhow!("Invalid RuleStatus value: {}", other)),
        }
    }
}

/// Trigger kind, with an explicit arm for values this build does not know.
///
/// Unknown kinds are carried through unchanged and simply never fire, so a
/// legacy rule cannot block evaluation of the rest of the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    PriceThreshold,
    BalanceThreshold,
    NetworkActivity,
    UserOnboarding,
    TransactionCount,
    TimeInterval,
    Other(String),
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerKind::PriceThreshold => "price_threshold",
            TriggerKind::BalanceThreshold => "balance_threshold",
            TriggerKind::NetworkActivity => "network_activity",
            TriggerKind::UserOnboarding => "user_onboarding",
            TriggerKind::TransactionCount => "transaction_count",
            TriggerKind::TimeInterval => "time_interval",
            TriggerKind::Other(other) => other,
        };
        f.write_str(s)
    }
}

impl FromStr for TriggerKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "price_threshold" => TriggerKind::PriceThreshold,
            "balance_threshold" => TriggerKind::BalanceThreshold,
            "network_activity" => TriggerKind::NetworkActivity,
            "user_onboarding" => TriggerKind::UserOnboarding,
            "transaction_count" => TriggerKind::TransactionCount,
            "time_interval" => TriggerKind::TimeInterval,
            other => TriggerKind::Other(other.to_string()),
        })
    }
}

/// Trigger comparison operator. Unknown operators never fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOp {
    Above,
    Below,
    Equals,
    Every,
    Other(String),
}

impl fmt::Display for TriggerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerOp::Above => "above",
            TriggerOp::Below => "below",
            TriggerOp::Equals => "equals",
            TriggerOp::Every => "every",
            TriggerOp::Other(other) => other,
        };
        f.write_str(s)
    }
}

impl FromStr for TriggerOp {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "above" => TriggerOp::Above,
            "below" => TriggerOp::Below,
            "equals" => TriggerOp::Equals,
            "every" => TriggerOp::Every,
            other => TriggerOp::Other(other.to_string()),
        })
    }
}

/// Action kind. The per-kind reward rate lives here so the table has one home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Stake,
    Unstake,
    Transfer,
    Swap,
    Bridge,
    DistributeRewards,
    Notify,
    Other(String),
}

impl ActionKind {
    /// Reward per unit of action amount. Unknown kinds earn nothing.
    pub fn reward_rate(&self) -> f64 {
        match self {
            ActionKind::Stake => 0.10,
            ActionKind::DistributeRewards => 0.05,
            ActionKind::Transfer => 0.02,
            ActionKind::Swap => 0.03,
            ActionKind::Bridge => 0.08,
            ActionKind::Unstake | ActionKind::Notify | ActionKind::Other(_) => 0.0,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Stake => "stake",
            ActionKind::Unstake => "unstake",
            ActionKind::Transfer => "transfer",
            ActionKind::Swap => "swap",
            ActionKind::Bridge => "bridge",
            ActionKind::DistributeRewards => "distribute_rewards",
            ActionKind::Notify => "notify",
            ActionKind::Other(other) => other,
        };
        f.write_str(s)
    }
}

impl FromStr for ActionKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stake" => ActionKind::Stake,
            "unstake" => ActionKind::Unstake,
            "transfer" => ActionKind::Transfer,
            "swap" => ActionKind::Swap,
            "bridge" => ActionKind::Bridge,
            "distribute_rewards" => ActionKind::DistributeRewards,
            "notify" => ActionKind::Notify,
            other => ActionKind::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Failed,
    Pending,
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::Failed => "failed",
            ExecutionOutcome::Pending => "pending",
        };
        f.write_str(s)
    }
}

impl FromStr for ExecutionOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ExecutionOutcome::Success),
            "failed" => Ok(ExecutionOutcome::Failed),
            "pending" => Ok(ExecutionOutcome::Pending),
            other => Err(anyhow::anyhow!("Invalid ExecutionOutcome value: {}", other)),
        }
    }
}

/// A user-owned automation rule: "if condition then action".
#[derive(Debug, Clone)]
pub struct WorkflowRule {
    pub id: RuleId,

    // Identity
    pub wallet_address: String,
    pub name: String,
    pub description: Option<String>,

    // Trigger
    pub trigger_kind: TriggerKind,
    pub trigger_op: TriggerOp,
    pub trigger_value: f64,
    pub trigger_token: Option<String>,

    // Action
    pub action_kind: ActionKind,
    pub action_amount: Option<f64>,
    pub action_recipient: Option<String>,
    pub action_token: Option<String>,

    // Progress. Counters only ever advance, and only on a firing.
    pub tokens_staked: f64,
    pub rewards_generated: f64,
    pub execution_count: u64,
    pub last_executed_at: Option<DateTime<Utc>>,

    // Lifecycle
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkflowRule {
    /// Human-readable "which condition was satisfied" line for the audit log.
    pub fn trigger_summary(&self) -> String {
        format!(
            "{}: {} {}",
            self.trigger_kind, self.trigger_op, self.trigger_value
        )
    }

    /// Human-readable "what the action did" line for the audit log.
    pub fn action_summary(&self) -> String {
        format!(
            "{}: {} {}",
            self.action_kind,
            self.action_amount.unwrap_or(0.0),
            self.action_token.as_deref().unwrap_or(DEFAULT_TOKEN)
        )
    }
}

impl Default for WorkflowRule {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: String::new(),
            name: String::new(),
            description: None,
            trigger_kind: TriggerKind::BalanceThreshold,
            trigger_op: TriggerOp::Above,
            trigger_value: 0.0,
            trigger_token: None,
            action_kind: ActionKind::Notify,
            action_amount: None,
            action_recipient: None,
            action_token: None,
            tokens_staked: 0.0,
            rewards_generated: 0.0,
            execution_count: 0,
            last_executed_at: None,
            status: RuleStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// User-supplied fields for a new rule; the rest is filled in on creation.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub name: String,
    pub description: Option<String>,
    pub trigger_kind: TriggerKind,
    pub trigger_op: TriggerOp,
    pub trigger_value: f64,
    pub trigger_token: Option<String>,
    pub action_kind: ActionKind,
    pub action_amount: Option<f64>,
    pub action_recipient: Option<String>,
    pub action_token: Option<String>,
    pub tokens_staked: f64,
}

impl NewRule {
    pub fn into_rule(self, owner: impl Into<String>) -> WorkflowRule {
        WorkflowRule {
            id: Uuid::new_v4(),
            wallet_address: owner.into(),
            name: self.name,
            description: self.description,
            trigger_kind: self.trigger_kind,
            trigger_op: self.trigger_op,
            trigger_value: self.trigger_value,
            trigger_token: self.trigger_token,
            action_kind: self.action_kind,
            action_amount: self.action_amount,
            action_recipient: self.action_recipient,
            action_token: self.action_token,
            tokens_staked: self.tokens_staked,
            rewards_generated: 0.0,
            execution_count: 0,
            last_executed_at: None,
            status: RuleStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// Append-only audit fact: one row per firing, never mutated.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub id: RecordId,
    pub rule_id: RuleId,
    pub executed_at: DateTime<Utc>,
    pub trigger_met: String,
    pub action_taken: String,
    pub outcome: ExecutionOutcome,
    pub rewards_earned: f64,
    pub transaction_hash: Option<String>,
    /// Opaque attachment, e.g. the market snapshot that drove the firing.
    pub details: Option<serde_json::Value>,
}

/// Narrow counter-update payload the engine writes after a firing.
#[derive(Debug, Clone, Copy)]
pub struct RuleCounters {
    pub execution_count: u64,
    pub rewards_generated: f64,
    pub last_executed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_strings() {
        for kind in [
            TriggerKind::PriceThreshold,
            TriggerKind::BalanceThreshold,
            TriggerKind::NetworkActivity,
            TriggerKind::UserOnboarding,
            TriggerKind::TransactionCount,
            TriggerKind::TimeInterval,
        ] {
            let parsed: TriggerKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }

        let parsed: TriggerKind = "price_oracle_v2".parse().unwrap();
        assert_eq!(parsed, TriggerKind::Other("price_oracle_v2".into()));
        assert_eq!(parsed.to_string(), "price_oracle_v2");
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!("archived".parse::<RuleStatus>().is_err());
        assert_eq!("paused".parse::<RuleStatus>().unwrap(), RuleStatus::Paused);
    }

    #[test]
    fn summaries_read_like_the_audit_log() {
        let rule = WorkflowRule {
            trigger_kind: TriggerKind::BalanceThreshold,
            trigger_op: TriggerOp::Above,
            trigger_value: 1000.0,
            action_kind: ActionKind::Stake,
            action_amount: Some(100.0),
            action_token: Some("RLO".into()),
            ..WorkflowRule::default()
        };

        assert_eq!(rule.trigger_summary(), "balance_threshold: above 1000");
        assert_eq!(rule.action_summary(), "stake: 100 RLO");
    }

    #[test]
    fn reward_rates_match_the_table() {
        assert!((ActionKind::Stake.reward_rate() - 0.10).abs() < 1e-12);
        assert!((ActionKind::DistributeRewards.reward_rate() - 0.05).abs() < 1e-12);
        assert!((ActionKind::Transfer.reward_rate() - 0.02).abs() < 1e-12);
        assert!((ActionKind::Swap.reward_rate() - 0.03).abs() < 1e-12);
        assert!((ActionKind::Bridge.reward_rate() - 0.08).abs() < 1e-12);
        assert_eq!(ActionKind::Unstake.reward_rate(), 0.0);
        assert_eq!(ActionKind::Notify.reward_rate(), 0.0);
        assert_eq!(ActionKind::Other("mint".into()).reward_rate(), 0.0);
    }
}
