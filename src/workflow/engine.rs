//! Workflow Engine Contract
//!
//! The graph engine is an external collaborator. The driver only needs
//! to construct one per run, call [`WorkflowEngine::run`] and read back
//! [`WorkflowEngine::status`]; node execution stays behind this trait.

use thiserror::Error;

use crate::store::RunStore;

use super::run::{GraphPayload, RunOutcome, UserInput};
use super::status::EngineStatus;

/// Errors raised by an engine or its factory.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid graph payload: {0}")]
    InvalidGraph(String),

    #[error("engine execution error: {0}")]
    Execution(String),
}

/// Arguments an engine is constructed from.
#[derive(Debug, Clone)]
pub struct EngineParams {
    pub workflow_id: String,
    pub user_id: String,
    pub graph: GraphPayload,
    /// False on first construction of a run
    pub is_resume: bool,
    pub max_steps: u32,
    pub timeout_minutes: u64,
}

/// A running workflow graph.
pub trait WorkflowEngine: Send {
    /// Advances execution until it finishes, needs input, or exhausts
    /// the step budget.
    fn run(&mut self, input: Option<UserInput>) -> Result<RunOutcome, EngineError>;

    /// Status after the most recent `run` call.
    fn status(&self) -> EngineStatus;

    /// Minutes a pause may wait for input before the run fails.
    fn timeout_minutes(&self) -> u64;
}

/// Builds engines for the driver.
///
/// The store handle is scoped to the run so the engine can keep its own
/// node-level state next to the driver's keys.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        params: EngineParams,
        store: RunStore,
    ) -> Result<Box<dyn WorkflowEngine>, EngineError>;
}
