//! Run Transition Timeline
//!
//! Records each externally visible status change of a run with its offset
//! from the start of the run, for the end-of-run log line and for
//! [`RunSummary`](super::driver::RunSummary).

use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

use crate::workflow::WorkflowStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub status: WorkflowStatus,
    /// Offset from the start of the run
    pub at: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionLog {
    transitions: Vec<Transition>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a status write. Repeated writes of the same status (the
    /// INPUT re-persist on every poll) collapse into the first entry.
    pub fn record(&mut self, status: WorkflowStatus, at: Duration) {
        if self.transitions.last().map(|t| t.status) == Some(status) {
            return;
        }
        self.transitions.push(Transition { status, at });
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Number of distinct pauses for input.
    pub fn pause_count(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.status == WorkflowStatus::Input)
            .count()
    }

    /// Total time spent in each non-terminal status, using `end` as the
    /// close of the last open interval.
    pub fn time_in_status(&self, end: Duration) -> HashMap<WorkflowStatus, Duration> {
        let mut totals = HashMap::new();
        for (i, transition) in self.transitions.iter().enumerate() {
            if transition.status.is_terminal() {
                continue;
            }
            let until = self
                .transitions
                .get(i + 1)
                .map(|next| next.at)
                .unwrap_or(end);
            *totals.entry(transition.status).or_insert(Duration::ZERO) +=
                until.saturating_sub(transition.at);
        }
        totals
    }

    /// One-line rendering, e.g. `RUNNING@0.0s -> INPUT@0.0s -> SUCCESS@2.0s`.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (i, transition) in self.transitions.iter().enumerate() {
            if i > 0 {
                out.push_str(" -> ");
            }
            let _ = write!(out, "{}@{:.1}s", transition.status, transition.at.as_secs_f64());
        }
        out
    }
}
