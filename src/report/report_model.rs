use serde::{Deserialize, Serialize};

use crate::spec::spec_model::TestResult;

// ============================================================================
// Suite report: aggregates scenario runs
// ============================================================================

/// Aggregated report for a batch of scenario runs.
///
/// Built from a `Vec<TestResult>` via `from_results()`. Consumed by the
/// console, HTML, and JUnit reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteReport {
    pub suite_name: String,

    /// Number of scenario runs
    pub total: usize,

    pub passed: usize,

    pub failed: usize,

    /// Steps that completed with a fallback, across all runs
    pub partial_steps: usize,

    /// Total execution duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub test_results: Vec<TestResult>,
}

impl TestSuiteReport {
    /// Build a suite report, computing the pass/fail/partial counts.
    pub fn from_results(suite_name: &str, results: Vec<TestResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let partial_steps = results.iter().map(|r| r.partial_count()).sum();
        Self {
            suite_name: suite_name.to_string(),
            total,
            passed,
            failed: total - passed,
            partial_steps,
            duration_ms: None,
            test_results: results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
