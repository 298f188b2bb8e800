//! Workflow Execution Driver
//!
//! Advances one workflow run through its lifecycle:
//! - Loads the graph payload and builds the engine
//! - Runs the engine until it finishes or pauses for input
//! - Polls the store while paused, resuming on input, failing on
//!   timeout or a stop request
//! - Persists a terminal status on every path, including panics
//!
//! The driver is single-threaded and blocks while paused. The only
//! suspension point is the poll sleep.

use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::DriverConfig;
use crate::store::{RunStore, StateStore, StoreError};
use crate::workflow::{
    EngineFactory, EngineParams, EngineStatus, RunContext, WorkflowStatus,
};

use super::clock::{Clock, SystemClock};
use super::error::DriverError;
use super::timeline::{Transition, TransitionLog};

/// Reason persisted when an engine fails without saying why.
const DEFAULT_FAILURE_REASON: &str = "workflow failed";

/// Final state of one driver invocation.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub unique_id: String,
    pub status: WorkflowStatus,
    pub reason: String,
    pub transitions: Vec<Transition>,
    pub elapsed: Duration,
}

/// Drives workflow runs against a shared state store.
pub struct Driver {
    backend: Arc<dyn StateStore>,
    factory: Arc<dyn EngineFactory>,
    config: DriverConfig,
    clock: Arc<dyn Clock>,
}

impl Driver {
    pub fn new(
        backend: Arc<dyn StateStore>,
        factory: Arc<dyn EngineFactory>,
        config: DriverConfig,
    ) -> Self {
        Self {
            backend,
            factory,
            config,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Executes a run to a terminal status.
    ///
    /// Never fails: every error is classified, logged and persisted as
    /// FAILED before returning. Callers observe the result through the
    /// store; the summary is informational.
    pub fn execute(&self, run: &RunContext) -> RunSummary {
        let store = RunStore::new(run.unique_id.as_str(), Arc::clone(&self.backend));
        let started = self.clock.now();
        let mut log = TransitionLog::new();

        match store.get_status() {
            Ok(Some(record)) if record.status.is_terminal() => {
                info!(
                    "Run '{}' already finished with {}, nothing to do",
                    run.unique_id, record.status
                );
                return RunSummary {
                    unique_id: run.unique_id.clone(),
                    status: record.status,
                    reason: record.reason,
                    transitions: Vec::new(),
                    elapsed: Duration::ZERO,
                };
            }
            Ok(Some(record)) => {
                warn!(
                    "Run '{}' found in {} state, restarting node execution from scratch",
                    run.unique_id, record.status
                );
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read previous status of '{}': {}", run.unique_id, e),
        }

        info!(
            "Starting workflow '{}' for user '{}' (chat: {})",
            run.workflow_id, run.user_id, run.chat_id
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.drive(run, &store, &mut log, started)
        }))
        .unwrap_or_else(|payload| Err(DriverError::Panicked(panic_message(payload))));

        let (status, reason) = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_ignorable() {
                    warn!("execute_workflow ignore error: {}", err);
                } else {
                    error!("execute_workflow error: {}", error_chain(&err));
                }

                let reason = non_empty_reason(err.persisted_reason(self.config.reason_limit));
                if let Err(e) = store.set_status(WorkflowStatus::Failed, &reason) {
                    error!("Failed to persist FAILED status for '{}': {}", run.unique_id, e);
                }
                log.record(WorkflowStatus::Failed, self.elapsed_since(started));
                (WorkflowStatus::Failed, reason)
            }
        };

        let elapsed = self.elapsed_since(started);
        let spent = log.time_in_status(elapsed);
        let time_in = |s: WorkflowStatus| spent.get(&s).copied().unwrap_or_default();
        info!(
            "Workflow '{}' finished with {} after {:.2?} ({}; {} pause(s), {:.2?} running, {:.2?} waiting for input)",
            run.workflow_id,
            status,
            elapsed,
            log.summary(),
            log.pause_count(),
            time_in(WorkflowStatus::Running),
            time_in(WorkflowStatus::Input)
        );

        RunSummary {
            unique_id: run.unique_id.clone(),
            status,
            reason,
            transitions: log.transitions().to_vec(),
            elapsed,
        }
    }

    /// The run loop. Returns the terminal status it persisted, or the
    /// error that ended the run (persisted by the caller).
    fn drive(
        &self,
        run: &RunContext,
        store: &RunStore,
        log: &mut TransitionLog,
        started: Duration,
    ) -> Result<(WorkflowStatus, String), DriverError> {
        self.persist(store, log, started, WorkflowStatus::Running, "")?;

        let graph = store
            .get_graph_payload()?
            .ok_or(DriverError::GraphPayloadMissing)?;

        let limits = &self.config.workflow;
        let params = EngineParams {
            workflow_id: run.workflow_id.clone(),
            user_id: run.user_id.clone(),
            graph,
            is_resume: false,
            max_steps: limits.max_steps,
            timeout_minutes: limits.timeout_minutes,
        };
        let mut engine = self.factory.create(params, store.clone())?;
        let timeout = Duration::from_secs(engine.timeout_minutes().saturating_mul(60));

        let mut outcome = engine.run(None)?;
        let mut pause_started: Option<Duration> = None;

        loop {
            let status = engine.status();
            debug!("workflow execute status: {}", status);

            match status {
                EngineStatus::Known(terminal) if terminal.is_terminal() => {
                    let reason = if terminal == WorkflowStatus::Failed {
                        non_empty_reason(outcome.reason)
                    } else {
                        outcome.reason
                    };
                    self.persist(store, log, started, terminal, &reason)?;
                    return Ok((terminal, reason));
                }
                EngineStatus::Known(WorkflowStatus::Input) => {
                    let now = self.clock.now();
                    let baseline = *pause_started.get_or_insert(now);

                    self.persist(store, log, started, WorkflowStatus::Input, &outcome.reason)?;
                    self.clock.sleep(self.config.poll_interval());

                    if self.clock.now().saturating_sub(baseline) > timeout {
                        return Err(DriverError::WaitTimeout);
                    }
                    if store.get_stop_requested()? {
                        return Err(DriverError::StoppedByUser);
                    }

                    let Some(input) = store.take_pending_input()? else {
                        continue;
                    };

                    info!("Received user input, resuming workflow '{}'", run.workflow_id);
                    self.persist(store, log, started, WorkflowStatus::Running, "")?;
                    outcome = engine.run(Some(input))?;
                    pause_started = None;
                }
                other => return Err(DriverError::UnexpectedStatus(other.to_string())),
            }
        }
    }

    fn persist(
        &self,
        store: &RunStore,
        log: &mut TransitionLog,
        started: Duration,
        status: WorkflowStatus,
        reason: &str,
    ) -> Result<(), StoreError> {
        store.set_status(status, reason)?;
        log.record(status, self.elapsed_since(started));
        Ok(())
    }

    fn elapsed_since(&self, started: Duration) -> Duration {
        self.clock.now().saturating_sub(started)
    }
}

fn non_empty_reason(reason: String) -> String {
    if reason.trim().is_empty() {
        DEFAULT_FAILURE_REASON.to_string()
    } else {
        reason
    }
}

/// Formats an error with its full source chain.
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": caused by: {}", cause));
        source = cause.source();
    }
    message
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunLimits;
    use crate::execution::clock::ManualClock;
    use crate::store::MemoryStore;
    use crate::workflow::{
        EngineError, RunOutcome, ScriptedEngineFactory, UserInput, WorkflowEngine,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn config(timeout_minutes: u64) -> DriverConfig {
        DriverConfig {
            workflow: RunLimits {
                max_steps: 50,
                timeout_minutes,
            },
            ..DriverConfig::default()
        }
    }

    fn run_ctx() -> RunContext {
        RunContext::new("r1", "wf-1", "chat-1", "user-1")
    }

    /// Store wrapper that records every status write.
    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: MemoryStore,
        writes: Arc<Mutex<Vec<WorkflowStatus>>>,
    }

    impl RecordingStore {
        fn writes(&self) -> Vec<WorkflowStatus> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl StateStore for RecordingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key.ends_with(":status") {
                let record: Value = serde_json::from_str(value)?;
                let status: WorkflowStatus = serde_json::from_value(record["status"].clone())?;
                self.writes.lock().unwrap().push(status);
            }
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key)
        }

        fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.take(key)
        }
    }

    /// Store whose input buffer is unreachable.
    struct BrokenInputStore {
        inner: MemoryStore,
    }

    impl StateStore for BrokenInputStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if key.ends_with(":input") {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key)
        }
    }

    struct Harness {
        store: RecordingStore,
        client: RunStore,
        factory: ScriptedEngineFactory,
        clock: ManualClock,
        driver: Driver,
    }

    fn harness(script: Value, timeout_minutes: u64) -> Harness {
        let store = RecordingStore::default();
        let client = RunStore::new("r1", Arc::new(store.clone()));
        client.set_graph_payload(&json!({ "script": script })).unwrap();

        let factory = ScriptedEngineFactory::new();
        let clock = ManualClock::new();
        let driver = Driver::new(
            Arc::new(store.clone()),
            Arc::new(factory.clone()),
            config(timeout_minutes),
        )
        .with_clock(Arc::new(clock.clone()));

        Harness {
            store,
            client,
            factory,
            clock,
            driver,
        }
    }

    fn final_status(client: &RunStore) -> (WorkflowStatus, String) {
        let record = client.get_status().unwrap().expect("status persisted");
        (record.status, record.reason)
    }

    #[test]
    fn test_input_before_timeout_resumes_to_success() {
        let h = harness(
            json!([{"status": "INPUT", "reason": "need value"}, {"status": "SUCCESS"}]),
            5,
        );
        let writer = h.client.clone();
        h.clock.schedule_at(secs(2), move || {
            writer.set_pending_input(&json!("42")).unwrap();
        });

        let summary = h.driver.execute(&run_ctx());

        assert_eq!(summary.status, WorkflowStatus::Success);
        assert_eq!(final_status(&h.client).0, WorkflowStatus::Success);
        assert_eq!(h.factory.inputs(), vec![None, Some(json!("42"))]);
        assert_eq!(h.client.get_pending_input().unwrap(), None);
        assert_eq!(
            h.store.writes(),
            vec![
                WorkflowStatus::Running,
                WorkflowStatus::Input,
                WorkflowStatus::Input,
                WorkflowStatus::Running,
                WorkflowStatus::Success,
            ]
        );
    }

    #[test]
    fn test_no_input_times_out() {
        let h = harness(json!([{"status": "INPUT", "reason": "need value"}]), 1);

        let summary = h.driver.execute(&run_ctx());

        let (status, reason) = final_status(&h.client);
        assert_eq!(status, WorkflowStatus::Failed);
        assert!(reason.contains("timeout"), "reason: {}", reason);
        assert_eq!(summary.reason, reason);
        assert!(summary.elapsed > secs(60));
        assert!(summary.elapsed <= secs(62));
    }

    #[test]
    fn test_stop_flag_fails_before_timeout() {
        let h = harness(json!([{"status": "INPUT", "reason": "need value"}]), 5);
        let writer = h.client.clone();
        h.clock.schedule_at(secs(3), move || writer.request_stop().unwrap());

        let summary = h.driver.execute(&run_ctx());

        let (status, reason) = final_status(&h.client);
        assert_eq!(status, WorkflowStatus::Failed);
        assert_eq!(reason, "workflow stop by user");
        assert_eq!(summary.elapsed, secs(3));
    }

    #[test]
    fn test_stop_flag_ignored_while_running() {
        let h = harness(json!([{"status": "SUCCESS"}]), 5);
        h.client.request_stop().unwrap();

        let summary = h.driver.execute(&run_ctx());

        assert_eq!(summary.status, WorkflowStatus::Success);
        assert_eq!(final_status(&h.client).0, WorkflowStatus::Success);
        assert_eq!(h.factory.inputs(), vec![None]);
    }

    #[test]
    fn test_stop_wins_over_pending_input() {
        let h = harness(
            json!([{"status": "INPUT", "reason": "need value"}, {"status": "SUCCESS"}]),
            5,
        );
        let writer = h.client.clone();
        h.clock.schedule_at(secs(1), move || {
            writer.set_pending_input(&json!("late")).unwrap();
            writer.request_stop().unwrap();
        });

        h.driver.execute(&run_ctx());

        assert_eq!(final_status(&h.client).1, "workflow stop by user");
        assert_eq!(h.factory.inputs(), vec![None]);
    }

    #[test]
    fn test_each_pause_gets_a_fresh_timeout_window() {
        let h = harness(
            json!([
                {"status": "INPUT", "reason": "first"},
                {"status": "INPUT", "reason": "second"},
                {"status": "SUCCESS"}
            ]),
            1,
        );
        let first = h.client.clone();
        h.clock.schedule_at(secs(54), move || {
            first.set_pending_input(&json!({"a": 1})).unwrap();
        });
        let second = h.client.clone();
        h.clock.schedule_at(secs(54 + 58), move || {
            second.set_pending_input(&json!({"b": 2})).unwrap();
        });

        let summary = h.driver.execute(&run_ctx());

        assert_eq!(summary.status, WorkflowStatus::Success);
        assert_eq!(h.factory.inputs().len(), 3);
        assert_eq!(summary.elapsed, secs(112));
    }

    #[test]
    fn test_second_pause_times_out_on_its_own_window() {
        let h = harness(
            json!([
                {"status": "INPUT", "reason": "first"},
                {"status": "INPUT", "reason": "second"}
            ]),
            1,
        );
        let writer = h.client.clone();
        h.clock.schedule_at(secs(54), move || {
            writer.set_pending_input(&json!("x")).unwrap();
        });

        let summary = h.driver.execute(&run_ctx());

        assert_eq!(summary.status, WorkflowStatus::Failed);
        assert!(summary.reason.contains("timeout"));
        // second pause starts at 54s and expires once 61s have passed
        assert_eq!(summary.elapsed, secs(54 + 61));
    }

    #[test]
    fn test_dry_polls_do_not_reset_deadline() {
        let h = harness(json!([{"status": "INPUT", "reason": "wait"}]), 1);
        let writer = h.client.clone();
        // empty input is a dry poll
        h.clock.schedule_at(secs(30), move || {
            writer.set_pending_input(&json!({})).unwrap();
        });

        let summary = h.driver.execute(&run_ctx());

        assert!(summary.reason.contains("timeout"));
        assert_eq!(summary.elapsed, secs(61));
    }

    #[test]
    fn test_observers_see_input_while_paused() {
        let h = harness(json!([{"status": "INPUT", "reason": "need value"}]), 5);
        let observed = Arc::new(Mutex::new(None));

        let reader = h.client.clone();
        let seen = Arc::clone(&observed);
        h.clock.schedule_at(secs(1), move || {
            *seen.lock().unwrap() = reader.get_status().unwrap();
        });
        let stopper = h.client.clone();
        h.clock.schedule_at(secs(2), move || stopper.request_stop().unwrap());

        h.driver.execute(&run_ctx());

        let record = observed.lock().unwrap().clone().expect("status observed");
        assert_eq!(record.status, WorkflowStatus::Input);
        assert_eq!(record.reason, "need value");
    }

    #[test]
    fn test_engine_result_persisted_unchanged_without_input() {
        let h = harness(json!([{"status": "FAILED", "reason": "node llm_1 failed"}]), 5);
        h.driver.execute(&run_ctx());
        assert_eq!(
            final_status(&h.client),
            (WorkflowStatus::Failed, "node llm_1 failed".to_string())
        );

        let h = harness(json!([{"status": "SUCCESS", "reason": "done"}]), 5);
        h.driver.execute(&run_ctx());
        assert_eq!(final_status(&h.client), (WorkflowStatus::Success, "done".to_string()));
        assert_eq!(h.clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_failed_without_reason_gets_default() {
        let h = harness(json!([{"status": "FAILED"}]), 5);
        h.driver.execute(&run_ctx());
        assert_eq!(final_status(&h.client).1, DEFAULT_FAILURE_REASON);
    }

    #[test]
    fn test_missing_payload_fails() {
        let store = MemoryStore::new();
        let factory = ScriptedEngineFactory::new();
        let driver = Driver::new(
            Arc::new(store.clone()),
            Arc::new(factory.clone()),
            DriverConfig::default(),
        )
        .with_clock(Arc::new(ManualClock::new()));

        let summary = driver.execute(&run_ctx());

        let client = RunStore::new("r1", Arc::new(store));
        let (status, reason) = final_status(&client);
        assert_eq!(status, WorkflowStatus::Failed);
        assert!(!reason.is_empty());
        assert!(reason.contains("not found"));
        assert_eq!(summary.status, WorkflowStatus::Failed);
        assert!(factory.created().is_empty());
    }

    #[test]
    fn test_null_payload_treated_as_missing() {
        let store = MemoryStore::new();
        let client = RunStore::new("r1", Arc::new(store.clone()));
        client.set_graph_payload(&Value::Null).unwrap();
        let factory = ScriptedEngineFactory::new();
        let driver = Driver::new(
            Arc::new(store),
            Arc::new(factory.clone()),
            DriverConfig::default(),
        )
        .with_clock(Arc::new(ManualClock::new()));

        driver.execute(&run_ctx());

        let (status, reason) = final_status(&client);
        assert_eq!(status, WorkflowStatus::Failed);
        assert_eq!(reason, DriverError::GraphPayloadMissing.to_string());
        assert!(factory.created().is_empty());
    }

    #[test]
    fn test_unrecognized_status_is_protocol_violation() {
        let h = harness(json!([{"status": "SLEEPING"}]), 5);
        h.driver.execute(&run_ctx());

        let (status, reason) = final_status(&h.client);
        assert_eq!(status, WorkflowStatus::Failed);
        assert_eq!(reason, "unexpected workflow status error: SLEEPING");
    }

    #[test]
    fn test_running_after_run_is_protocol_violation() {
        let h = harness(json!([{"status": "RUNNING"}]), 5);
        h.driver.execute(&run_ctx());
        assert_eq!(
            final_status(&h.client),
            (
                WorkflowStatus::Failed,
                "unexpected workflow status error: RUNNING".to_string()
            )
        );
    }

    #[test]
    fn test_engine_params_come_from_config() {
        let h = harness(json!([{"status": "SUCCESS"}]), 9);
        h.driver.execute(&run_ctx());

        let created = h.factory.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].workflow_id, "wf-1");
        assert_eq!(created[0].user_id, "user-1");
        assert_eq!(created[0].max_steps, 50);
        assert_eq!(created[0].timeout_minutes, 9);
        assert!(!created[0].is_resume);
    }

    #[test]
    fn test_finished_run_is_not_touched_again() {
        let h = harness(json!([{"status": "SUCCESS"}]), 5);
        h.client.set_status(WorkflowStatus::Failed, "earlier failure").unwrap();
        let writes_before = h.store.writes().len();

        let summary = h.driver.execute(&run_ctx());

        assert_eq!(summary.status, WorkflowStatus::Failed);
        assert_eq!(summary.reason, "earlier failure");
        assert_eq!(h.store.writes().len(), writes_before);
        assert!(h.factory.created().is_empty());
    }

    #[test]
    fn test_interrupted_run_restarts_from_scratch() {
        let h = harness(json!([{"status": "SUCCESS"}]), 5);
        h.client.set_status(WorkflowStatus::Input, "need value").unwrap();

        let summary = h.driver.execute(&run_ctx());

        assert_eq!(summary.status, WorkflowStatus::Success);
        assert_eq!(h.factory.created().len(), 1);
        assert!(!h.factory.created()[0].is_resume);
    }

    #[test]
    fn test_store_failure_in_loop_fails_run() {
        let inner = MemoryStore::new();
        let client = RunStore::new("r1", Arc::new(inner.clone()));
        client
            .set_graph_payload(&json!({"script": [{"status": "INPUT", "reason": "q"}]}))
            .unwrap();

        let driver = Driver::new(
            Arc::new(BrokenInputStore { inner }),
            Arc::new(ScriptedEngineFactory::new()),
            DriverConfig::default(),
        )
        .with_clock(Arc::new(ManualClock::new()));

        let summary = driver.execute(&run_ctx());

        let (status, reason) = final_status(&client);
        assert_eq!(status, WorkflowStatus::Failed);
        assert!(reason.starts_with("state store error"), "reason: {}", reason);
        assert_eq!(summary.status, WorkflowStatus::Failed);
    }

    /// Engine whose `status()` disagrees with what `run` returned.
    struct OverriddenStatusEngine;

    impl WorkflowEngine for OverriddenStatusEngine {
        fn run(&mut self, _input: Option<UserInput>) -> Result<RunOutcome, EngineError> {
            Ok(RunOutcome::input("stale snapshot"))
        }

        fn status(&self) -> EngineStatus {
            WorkflowStatus::Success.into()
        }

        fn timeout_minutes(&self) -> u64 {
            5
        }
    }

    struct LongErrorEngine;

    impl WorkflowEngine for LongErrorEngine {
        fn run(&mut self, _input: Option<UserInput>) -> Result<RunOutcome, EngineError> {
            Err(EngineError::Execution("x".repeat(400)))
        }

        fn status(&self) -> EngineStatus {
            WorkflowStatus::Running.into()
        }

        fn timeout_minutes(&self) -> u64 {
            5
        }
    }

    struct PanickingEngine;

    impl WorkflowEngine for PanickingEngine {
        fn run(&mut self, _input: Option<UserInput>) -> Result<RunOutcome, EngineError> {
            panic!("node exploded");
        }

        fn status(&self) -> EngineStatus {
            WorkflowStatus::Running.into()
        }

        fn timeout_minutes(&self) -> u64 {
            5
        }
    }

    struct FixedFactory<F>(F);

    impl<F> EngineFactory for FixedFactory<F>
    where
        F: Fn() -> Box<dyn WorkflowEngine> + Send + Sync,
    {
        fn create(
            &self,
            _params: EngineParams,
            _store: RunStore,
        ) -> Result<Box<dyn WorkflowEngine>, EngineError> {
            Ok((self.0)())
        }
    }

    fn run_with_engine<F>(make: F) -> (WorkflowStatus, String)
    where
        F: Fn() -> Box<dyn WorkflowEngine> + Send + Sync + 'static,
    {
        let store = MemoryStore::new();
        let client = RunStore::new("r1", Arc::new(store.clone()));
        client.set_graph_payload(&json!({"nodes": []})).unwrap();

        let driver = Driver::new(
            Arc::new(store),
            Arc::new(FixedFactory(make)),
            DriverConfig::default(),
        )
        .with_clock(Arc::new(ManualClock::new()));
        driver.execute(&run_ctx());

        final_status(&client)
    }

    #[test]
    fn test_engine_status_wins_over_returned_tuple() {
        let (status, reason) = run_with_engine(|| Box::new(OverriddenStatusEngine) as Box<dyn WorkflowEngine>);
        assert_eq!(status, WorkflowStatus::Success);
        assert_eq!(reason, "stale snapshot");
    }

    #[test]
    fn test_unexpected_error_reason_truncated() {
        let (status, reason) = run_with_engine(|| Box::new(LongErrorEngine) as Box<dyn WorkflowEngine>);
        assert_eq!(status, WorkflowStatus::Failed);
        assert_eq!(reason.chars().count(), 100);
    }

    #[test]
    fn test_engine_panic_becomes_failure() {
        let (status, reason) = run_with_engine(|| Box::new(PanickingEngine) as Box<dyn WorkflowEngine>);
        assert_eq!(status, WorkflowStatus::Failed);
        assert!(reason.starts_with("workflow panicked"), "reason: {}", reason);
        assert!(reason.contains("node exploded"), "reason: {}", reason);
    }

    #[test]
    fn test_status_is_terminal_after_every_invocation() {
        let scripts = [
            json!([{"status": "SUCCESS"}]),
            json!([{"status": "FAILED", "reason": "x"}]),
            json!([{"status": "INPUT", "reason": "q"}]),
            json!([{"status": "???"}]),
            json!([]),
        ];
        for script in scripts {
            let h = harness(script.clone(), 1);
            h.driver.execute(&run_ctx());
            let (status, reason) = final_status(&h.client);
            assert!(status.is_terminal(), "script {} left {}", script, status);
            if status == WorkflowStatus::Failed {
                assert!(!reason.is_empty());
            }
            let writes = h.store.writes();
            assert!(writes.last().unwrap().is_terminal());
            assert_eq!(writes.iter().filter(|s| s.is_terminal()).count(), 1);
        }
    }

    #[test]
    fn test_summary_records_transitions() {
        let h = harness(
            json!([{"status": "INPUT", "reason": "q"}, {"status": "SUCCESS"}]),
            5,
        );
        let writer = h.client.clone();
        h.clock.schedule_at(secs(4), move || {
            writer.set_pending_input(&json!("a")).unwrap();
        });

        let summary = h.driver.execute(&run_ctx());

        let statuses: Vec<_> = summary.transitions.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![
                WorkflowStatus::Running,
                WorkflowStatus::Input,
                WorkflowStatus::Running,
                WorkflowStatus::Success,
            ]
        );
        assert_eq!(summary.transitions[2].at, secs(4));
        assert_eq!(summary.unique_id, "r1");
    }
}
