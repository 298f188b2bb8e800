//! Driver Failure Taxonomy
//!
//! Every way a run can end other than the engine reporting a terminal
//! status. Ignorable failures are routine outcomes of a paused run and
//! are persisted verbatim; everything else is unexpected and persisted
//! truncated.

use thiserror::Error;

use crate::store::StoreError;
use crate::workflow::EngineError;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("workflow wait user input timeout")]
    WaitTimeout,

    #[error("workflow stop by user")]
    StoppedByUser,

    #[error("workflow data not found maybe data is expired")]
    GraphPayloadMissing,

    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("workflow engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("unexpected workflow status error: {0}")]
    UnexpectedStatus(String),

    #[error("workflow panicked: {0}")]
    Panicked(String),
}

impl DriverError {
    /// Timeouts and user stops are expected ends of a paused run.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::WaitTimeout | Self::StoppedByUser)
    }

    /// Reason to persist with the FAILED status.
    pub fn persisted_reason(&self, limit: usize) -> String {
        let message = self.to_string();
        if self.is_ignorable() {
            message
        } else {
            truncate_chars(&message, limit)
        }
    }
}

/// Cuts `s` to at most `limit` characters without splitting a character.
pub fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
