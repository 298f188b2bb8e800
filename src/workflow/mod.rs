//! Workflow Run Module
//!
//! Types shared by the driver and the external graph engine.
//!
//! # Structure
//!
//! - [`status`]: Lifecycle states and engine-reported status
//! - [`run`]: Run identifiers and `(status, reason)` outcomes
//! - [`engine`]: Engine and engine-factory traits
//! - [`scripted`]: Replay engine driven by a scripted payload

pub mod engine;
pub mod run;
pub mod scripted;
pub mod status;

pub use engine::{EngineError, EngineFactory, EngineParams, WorkflowEngine};
pub use run::{GraphPayload, RunContext, RunOutcome, UserInput};
pub use scripted::{ScriptedEngine, ScriptedEngineFactory};
pub use status::{EngineStatus, WorkflowStatus};
