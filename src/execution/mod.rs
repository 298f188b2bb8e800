//! Workflow Execution Module
//!
//! Drives workflow runs through their lifecycle, including pause/resume
//! for user input, wait timeouts and user-requested stops.
//!
//! # Architecture
//!
//! - [`driver`]: The run loop and lifecycle state machine
//! - [`dispatch`]: Entry point called by task-queue workers
//! - [`error`]: Failure taxonomy and reason truncation
//! - [`clock`]: Real and virtual time sources
//! - [`timeline`]: Status transition log

pub mod clock;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod timeline;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::Dispatcher;
pub use driver::{Driver, RunSummary};
pub use error::DriverError;
pub use timeline::{Transition, TransitionLog};
