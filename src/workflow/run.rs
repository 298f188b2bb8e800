//! Run Identity and Outcomes

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::status::{EngineStatus, WorkflowStatus};

/// Data a user supplies to a paused run (usually a map of node id to values).
pub type UserInput = Value;

/// Serialized workflow graph, opaque to the driver.
pub type GraphPayload = Value;

/// Identifiers scoping one workflow execution.
///
/// `unique_id` keys every state-store lookup; the other three are carried
/// through to the engine and to log lines.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Primary key of this execution, generated before dispatch
    pub unique_id: String,
    /// Workflow definition this run executes
    pub workflow_id: String,
    /// Conversation the run belongs to
    pub chat_id: String,
    /// Owner of the run
    pub user_id: String,
}

impl RunContext {
    pub fn new(
        unique_id: impl Into<String>,
        workflow_id: impl Into<String>,
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            workflow_id: workflow_id.into(),
            chat_id: chat_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// The `(status, reason)` pair returned by one engine `run` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: EngineStatus,
    pub reason: String,
}

impl RunOutcome {
    pub fn new(status: impl Into<EngineStatus>, reason: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            reason: reason.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(WorkflowStatus::Success, "")
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(WorkflowStatus::Failed, reason)
    }

    pub fn input(reason: impl Into<String>) -> Self {
        Self::new(WorkflowStatus::Input, reason)
    }
}
