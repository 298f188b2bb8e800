//! Scripted Replay Engine
//!
//! An engine whose graph payload is a list of outcomes to report, one per
//! `run` call. It lets the driver be exercised end to end (CLI, tests)
//! without a real graph engine.
//!
//! # Payload Format
//!
//! ```json
//! {
//!   "script": [
//!     { "status": "INPUT", "reason": "need value" },
//!     { "status": "SUCCESS" }
//!   ]
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::debug;
use serde::Deserialize;

use crate::store::RunStore;

use super::engine::{EngineError, EngineFactory, EngineParams, WorkflowEngine};
use super::run::{RunOutcome, UserInput};
use super::status::{EngineStatus, WorkflowStatus};

/// One scripted `run` result.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub status: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, Debug)]
struct Script {
    script: Vec<ScriptStep>,
}

/// Inputs received by engines, shared with the factory that built them.
type InputLog = Arc<Mutex<Vec<Option<UserInput>>>>;

/// Replays a fixed sequence of outcomes.
pub struct ScriptedEngine {
    steps: VecDeque<ScriptStep>,
    status: EngineStatus,
    steps_taken: u32,
    max_steps: u32,
    timeout_minutes: u64,
    inputs: InputLog,
}

impl ScriptedEngine {
    /// Builds an engine from its graph payload.
    pub fn from_params(params: &EngineParams) -> Result<Self, EngineError> {
        let script: Script = serde_json::from_value(params.graph.clone())
            .map_err(|e| EngineError::InvalidGraph(e.to_string()))?;

        Ok(Self {
            steps: script.script.into(),
            status: WorkflowStatus::Running.into(),
            steps_taken: 0,
            max_steps: params.max_steps,
            timeout_minutes: params.timeout_minutes,
            inputs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn with_input_log(mut self, inputs: InputLog) -> Self {
        self.inputs = inputs;
        self
    }

    fn record_input(&self, input: Option<UserInput>) {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input);
        }
    }
}

impl WorkflowEngine for ScriptedEngine {
    fn run(&mut self, input: Option<UserInput>) -> Result<RunOutcome, EngineError> {
        self.record_input(input);
        self.steps_taken += 1;

        let outcome = if self.steps_taken > self.max_steps {
            RunOutcome::failed(format!("exceeded max steps ({})", self.max_steps))
        } else {
            match self.steps.pop_front() {
                Some(step) => RunOutcome::new(EngineStatus::parse(&step.status), step.reason),
                None => RunOutcome::failed("script exhausted"),
            }
        };

        debug!("Scripted engine step {} -> {}", self.steps_taken, outcome.status);
        self.status = outcome.status.clone();
        Ok(outcome)
    }

    fn status(&self) -> EngineStatus {
        self.status.clone()
    }

    fn timeout_minutes(&self) -> u64 {
        self.timeout_minutes
    }
}

/// Factory for [`ScriptedEngine`]s that remembers what it built.
#[derive(Default, Clone)]
pub struct ScriptedEngineFactory {
    created: Arc<Mutex<Vec<EngineParams>>>,
    inputs: InputLog,
}

impl ScriptedEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters of every engine created so far.
    pub fn created(&self) -> Vec<EngineParams> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Inputs passed to `run`, in call order, across all engines.
    pub fn inputs(&self) -> Vec<Option<UserInput>> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

impl EngineFactory for ScriptedEngineFactory {
    fn create(
        &self,
        params: EngineParams,
        _store: RunStore,
    ) -> Result<Box<dyn WorkflowEngine>, EngineError> {
        let engine = ScriptedEngine::from_params(&params)?.with_input_log(Arc::clone(&self.inputs));
        if let Ok(mut created) = self.created.lock() {
            created.push(params);
        }
        Ok(Box::new(engine))
    }
}
