//! The client-side scheduler.
//!
//! Two triggers funnel into the same entry point: a manual on-demand call
//! and a periodic timer that runs while the wallet session is connected.
//! An in-flight flag suppresses overlapping passes for the owner, so a slow
//! pass can never double-count a firing rule's counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::notify::{Notification, NotificationSink};
use crate::types::{BalanceSource, SchedulerConfig};
use common::logger::{TraceId, eval_span};
use engine::{EvaluationEngine, EvaluationOutput};
use workflow::manager::WorkflowManager;
use workflow::store::WorkflowStore;

/// Clears the in-flight flag when dropped, so an aborted pass (the ticker
/// task being cancelled at an await point) can never leave it stuck.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct WorkflowScheduler<S: WorkflowStore> {
    cfg: SchedulerConfig,
    manager: Arc<WorkflowManager<S>>,
    engine: Arc<EvaluationEngine<S>>,
    balance: Arc<dyn BalanceSource>,
    notifier: Arc<dyn NotificationSink>,

    /// Set while a pass is running; owned here, not module-global.
    in_flight: AtomicBool,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: WorkflowStore + 'static> WorkflowScheduler<S> {
    pub fn new(
        cfg: SchedulerConfig,
        manager: Arc<WorkflowManager<S>>,
        engine: Arc<EvaluationEngine<S>>,
        balance: Arc<dyn BalanceSource>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            cfg,
            manager,
            engine,
            balance,
            notifier,
            in_flight: AtomicBool::new(false),
            ticker: Mutex::new(None),
        }
    }

    /// Run one evaluation pass now (manual trigger or timer tick).
    ///
    /// Returns `Ok(None)` when another pass for this session is still in
    /// flight; the call is a no-op, nothing is evaluated twice. On engine
    /// failure the cached rule state is left untouched and a generic
    /// user-facing failure is emitted; there is no automatic retry, the
    /// next timer tick tries again naturally.
    pub async fn evaluate_now(
        &self,
        owner: &str,
    ) -> anyhow::Result<Option<EvaluationOutput>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(owner, "evaluation already in flight, skipping");
            return Ok(None);
        }

        let _guard = InFlightGuard {
            flag: &self.in_flight,
        };

        let trace_id = TraceId::default();
        let outcome = self
            .run_pass(owner)
            .instrument(eval_span(owner, &trace_id))
            .await;

        match outcome {
            Ok(out) => Ok(Some(out)),
            Err(e) => {
                tracing::warn!(owner, error = %e, "evaluation pass failed");
                self.notifier.notify(Notification::error(
                    "Evaluation Failed",
                    "Workflow evaluation did not complete; will retry on the next cycle",
                ));
                Err(anyhow::Error::from(e))
            }
        }
    }

    async fn run_pass(&self, owner: &str) -> Result<EvaluationOutput, engine::EngineError> {
        let balance = self.balance.current(owner);
        let out = self.engine.evaluate(owner, balance).await?;

        // Merge firings into the cached rule list by id match. Counters
        // advance; status is never touched, so a concurrent local
        // pause/resume survives the merge.
        let now = Utc::now();
        for fired in &out.results {
            self.manager.record_firing(fired.rule_id, fired.reward, now).await;

            self.notifier.notify(Notification::success(
                "Workflow Executed",
                format!(
                    "\"{}\" triggered: {} (+{:.2} rewards)",
                    fired.name, fired.action, fired.reward
                ),
            ));
        }

        Ok(out)
    }

    /// Start the periodic trigger for a connected session.
    ///
    /// No-op if the ticker is already running. Call [`stop`] on session
    /// disconnect.
    ///
    /// [`stop`]: WorkflowScheduler::stop
    pub async fn start(self: &Arc<Self>, owner: String) {
        let mut ticker = self.ticker.lock().await;

        if ticker.is_some() {
            tracing::warn!(owner, "scheduler already running");
            return;
        }

        let this = Arc::clone(self);
        let interval = self.cfg.eval_interval;

        *ticker = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            // Skip the immediate first tick; the first pass runs one full
            // interval after connect, as the hosting UI expects.
            tick.tick().await;

            loop {
                tick.tick().await;

                if let Err(e) = this.evaluate_now(&owner).await {
                    tracing::debug!(owner, error = %e, "periodic pass failed");
                }
            }
        }));
    }

    /// Stop the periodic trigger (session disconnect).
    pub async fn stop(&self) {
        let mut ticker = self.ticker.lock().await;

        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }

    /// Whether a pass is currently running.
    pub fn is_evaluating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}
