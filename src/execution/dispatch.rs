//! Task Dispatch Entry Point
//!
//! What a task-queue worker calls for each run. Opens the run's span so
//! every log line carries its trace id, then hands off to the [`Driver`].
//! Results are only visible through the state store.

use log::debug;

use crate::logging::run_span;
use crate::workflow::RunContext;

use super::driver::Driver;

pub struct Dispatcher {
    driver: Driver,
}

impl Dispatcher {
    pub fn new(driver: Driver) -> Self {
        Self { driver }
    }

    /// Executes one workflow run under the trace id `run_id`.
    pub fn execute(&self, run_id: &str, workflow_id: &str, conversation_id: &str, owner_id: &str) {
        let _span = run_span(run_id).entered();
        let run = RunContext::new(run_id, workflow_id, conversation_id, owner_id);

        let summary = self.driver.execute(&run);
        debug!(
            "Dispatch of '{}' done: {} ({} transitions)",
            summary.unique_id,
            summary.status,
            summary.transitions.len()
        );
    }
}
