
use std::sync::Arc;

use chrono::Utc;
use mock_store::InMemoryWorkflowStore;
use workflow::manager::{RuleChange, WorkflowManager};
use workflow::model::{
    ActionKind, NewRule, RuleStatus, TriggerKind, TriggerOp, WorkflowRule,
};
use workflow::store::WorkflowStore;

const OWNER: &str = "0xabc123";

fn sample_spec(name: &str) -> NewRule {
    NewRule {
        name: name.into(),
        description: None,
        trigger_kind: TriggerKind::BalanceThreshold,
        trigger_op: TriggerOp::Above,
        trigger_value: 1000.0,
        trigger_token: Some("RLO".into()),
        action_kind: ActionKind::Stake,
        action_amount: Some(100.0),
        action_recipient: None,
        action_token: Some("RLO".into()),
        tokens_staked: 0.0,
    }
}

#[tokio::test]
async fn fresh_wallet_is_seeded_with_defaults() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());

    let rules = mgr.load_for_owner(OWNER).await?;

    assert_eq!(rules.len(), 3);
    assert!(rules.iter().all(|r| r.wallet_address == OWNER));
    assert!(rules.iter().all(|r| r.status == RuleStatus::Active));

    let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"Auto-Stake Rewards"));
    assert!(names.contains(&"Price Alert Buy"));
    assert!(names.contains(&"Network Activity Bridge"));

    // Seeds were persisted, not just cached.
    assert_eq!(store.map.lock().await.len(), 3);

    Ok(())
}

#[tokio::test]
async fn existing_wallet_is_not_reseeded() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    store
        .save(&sample_spec("Mine").into_rule(OWNER))
        .await?;

    let mgr = WorkflowManager::new(store.clone());
    let rules = mgr.load_for_owner(OWNER).await?;

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "Mine");

    Ok(())
}

#[tokio::test]
async fn create_rule_stores_and_indexes() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());

    let id = mgr.create_rule(OWNER, sample_spec("Manual")).await?;

    assert!(mgr.get_rule(id).await.is_some());
    assert!(store.map.lock().await.contains_key(&id));
    assert_eq!(mgr.rules_for_owner(OWNER).await.len(), 1);

    Ok(())
}

#[tokio::test]
async fn failed_create_is_not_cached() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());

    store.fail_next_saves(true);
    let result = mgr.create_rule(OWNER, sample_spec("Lost")).await;
    assert!(result.is_err());

    assert!(mgr.rules_for_owner(OWNER).await.is_empty());
    assert!(store.map.lock().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn set_status_persists_the_toggle() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());
    let id = mgr.create_rule(OWNER, sample_spec("Toggle")).await?;

    mgr.set_status(id, RuleStatus::Paused).await?;

    assert_eq!(mgr.get_rule(id).await.unwrap().status, RuleStatus::Paused);
    let stored = store.map.lock().await.get(&id).unwrap().clone();
    assert_eq!(stored.status, RuleStatus::Paused);

    Ok(())
}

#[tokio::test]
async fn failed_toggle_rolls_the_cache_back() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());
    let id = mgr.create_rule(OWNER, sample_spec("Toggle")).await?;

    store.fail_next_status_updates(true);
    let result = mgr.set_status(id, RuleStatus::Paused).await;
    assert!(result.is_err());

    // Optimistic update was compensated.
    assert_eq!(mgr.get_rule(id).await.unwrap().status, RuleStatus::Active);
    let stored = store.map.lock().await.get(&id).unwrap().clone();
    assert_eq!(stored.status, RuleStatus::Active);

    Ok(())
}

#[tokio::test]
async fn toggle_does_not_roll_back_counters_committed_to_the_store() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());
    let id = mgr.create_rule(OWNER, sample_spec("Racy")).await?;

    // An evaluation pass commits counters straight to the store; the cache
    // has not been merged yet.
    let counters = workflow::model::RuleCounters {
        execution_count: 1,
        rewards_generated: 10.0,
        last_executed_at: Utc::now(),
    };
    store.update_counters(id, &counters).await?;

    mgr.set_status(id, RuleStatus::Paused).await?;

    let stored = store.map.lock().await.get(&id).unwrap().clone();
    assert_eq!(stored.status, RuleStatus::Paused);
    assert_eq!(stored.execution_count, 1);
    assert!((stored.rewards_generated - 10.0).abs() < 1e-9);
    assert!(stored.last_executed_at.is_some());

    Ok(())
}

#[tokio::test]
async fn delete_removes_store_cache_and_index() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());
    let id = mgr.create_rule(OWNER, sample_spec("Gone")).await?;

    mgr.delete_rule(id).await?;

    assert!(mgr.get_rule(id).await.is_none());
    assert!(store.map.lock().await.is_empty());
    assert!(mgr.rules_for_owner(OWNER).await.is_empty());

    Ok(())
}

#[tokio::test]
async fn record_firing_advances_counters_without_touching_status() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());
    let id = mgr.create_rule(OWNER, sample_spec("Fired")).await?;

    mgr.set_status(id, RuleStatus::Paused).await?;
    mgr.record_firing(id, 10.0, Utc::now()).await;
    mgr.record_firing(id, 2.5, Utc::now()).await;

    let cached = mgr.get_rule(id).await.unwrap();
    assert_eq!(cached.execution_count, 2);
    assert!((cached.rewards_generated - 12.5).abs() < 1e-9);
    assert!(cached.last_executed_at.is_some());
    assert_eq!(cached.status, RuleStatus::Paused);

    Ok(())
}

#[tokio::test]
async fn remote_changes_reconcile_into_the_cache() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());

    // Insert for this owner lands in the cache.
    let rule = sample_spec("Remote").into_rule(OWNER);
    let id = rule.id;
    mgr.apply_change(OWNER, RuleChange::Inserted(rule.clone())).await;
    assert!(mgr.get_rule(id).await.is_some());

    // Duplicate insert is ignored.
    mgr.apply_change(OWNER, RuleChange::Inserted(rule.clone())).await;
    assert_eq!(mgr.rules_for_owner(OWNER).await.len(), 1);

    // Insert for another owner is ignored.
    let foreign = sample_spec("Foreign").into_rule("0xother");
    mgr.apply_change(OWNER, RuleChange::Inserted(foreign.clone())).await;
    assert!(mgr.get_rule(foreign.id).await.is_none());

    // Update replaces the cached copy.
    let mut updated = rule.clone();
    updated.name = "Renamed".into();
    mgr.apply_change(OWNER, RuleChange::Updated(updated)).await;
    assert_eq!(mgr.get_rule(id).await.unwrap().name, "Renamed");

    // Delete clears cache and index.
    mgr.apply_change(OWNER, RuleChange::Deleted(id)).await;
    assert!(mgr.get_rule(id).await.is_none());
    assert!(mgr.rules_for_owner(OWNER).await.is_empty());

    Ok(())
}

#[tokio::test]
async fn update_for_locally_deleted_rule_does_not_resurrect_it() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let mgr = WorkflowManager::new(store.clone());
    let id = mgr.create_rule(OWNER, sample_spec("Doomed")).await?;

    mgr.delete_rule(id).await?;

    let ghost = WorkflowRule {
        id,
        wallet_address: OWNER.into(),
        name: "Doomed".into(),
        ..WorkflowRule::default()
    };
    mgr.apply_change(OWNER, RuleChange::Updated(ghost)).await;

    assert!(mgr.get_rule(id).await.is_none());

    Ok(())
}
