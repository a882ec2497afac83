use std::path::PathBuf;

use crate::spec::spec_model::{StepOutcome, StepStatus};

/// Tracks the execution state and results of a running scenario.
#[derive(Debug, Clone)]
pub struct TestContext {
    /// Current step index (0-based)
    pub current_step: usize,

    /// Outcomes recorded so far, in step order
    pub step_outcomes: Vec<StepOutcome>,

    /// Diagnostic files captured so far
    pub artifacts: Vec<PathBuf>,
}

impl TestContext {
    pub fn new() -> Self {
        TestContext {
            current_step: 0,
            step_outcomes: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: StepOutcome) {
        self.step_outcomes.push(outcome);
    }

    pub fn add_artifact(&mut self, path: Option<PathBuf>) {
        if let Some(path) = path {
            self.artifacts.push(path);
        }
    }

    /// No step has failed. Partial steps still count as passing.
    pub fn all_passed(&self) -> bool {
        self.fail_count() == 0
    }

    pub fn pass_count(&self) -> usize {
        self.count(StepStatus::Passed)
    }

    pub fn partial_count(&self) -> usize {
        self.count(StepStatus::Partial)
    }

    pub fn fail_count(&self) -> usize {
        self.count(StepStatus::Failed)
    }

    pub fn total_count(&self) -> usize {
        self.step_outcomes.len()
    }

    fn count(&self, status: StepStatus) -> usize {
        self.step_outcomes
            .iter()
            .filter(|o| o.status == status)
            .count()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
