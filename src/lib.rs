//! FlowDriver - Resumable Workflow Execution Driver
//!
//! Runs long-lived workflow executions for a multi-tenant LLM platform.
//! A run may pause for human input, must survive worker restarts, and
//! keeps its status in a shared state store so any process can observe
//! it.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`workflow`]: Run identity, lifecycle status and the engine contract
//! - [`store`]: State store trait, typed run client and backends
//! - [`execution`]: The driver loop, failure taxonomy and dispatch
//! - [`config`]: Run limits and polling settings
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use flowdriver::config::DriverConfig;
//! use flowdriver::execution::{Dispatcher, Driver};
//! use flowdriver::store::FileStore;
//! use flowdriver::workflow::ScriptedEngineFactory;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::open(".flowdriver")?;
//!     let driver = Driver::new(
//!         Arc::new(store),
//!         Arc::new(ScriptedEngineFactory::new()),
//!         DriverConfig::load_default()?,
//!     );
//!
//!     Dispatcher::new(driver).execute("run-1", "workflow-1", "chat-1", "user-1");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod execution;
pub mod logging;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use config::DriverConfig;
pub use execution::{Dispatcher, Driver};
pub use store::{RunStore, StateStore};
pub use workflow::{RunContext, WorkflowStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "FlowDriver";
