//! Workflow Lifecycle Status
//!
//! The four lifecycle states a run moves through, plus the wider
//! [`EngineStatus`] the driver reads back from an engine. Engines may
//! report anything; only the four known names are ever persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a workflow run as persisted in the state store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowStatus {
    /// The engine is actively executing nodes
    Running,
    /// Paused until a user supplies input
    Input,
    /// Finished successfully (terminal)
    Success,
    /// Finished with an error (terminal)
    Failed,
}

impl WorkflowStatus {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Input => "INPUT",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }

    /// Returns true for SUCCESS and FAILED.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the four lifecycle names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown workflow status: '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for WorkflowStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(Self::Running),
            "INPUT" => Ok(Self::Input),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Status as reported by an engine.
///
/// `Unrecognized` keeps the raw value so it can be reported in the
/// protocol-violation failure; it is never written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Known(WorkflowStatus),
    Unrecognized(String),
}

impl EngineStatus {
    /// Parses an engine-provided status string. Never fails.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<WorkflowStatus>()
            .map(Self::Known)
            .unwrap_or_else(|_| Self::Unrecognized(raw.to_string()))
    }
}

impl From<WorkflowStatus> for EngineStatus {
    fn from(status: WorkflowStatus) -> Self {
        Self::Known(status)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(status) => status.fmt(f),
            Self::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}
