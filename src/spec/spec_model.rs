use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::driver::adapter::Selector;
use crate::locator::model::OptionMatch;

/// A scenario: one flow through the app, optionally run once per variation.
///
/// Replaces families of near-identical test scripts with a single step list
/// plus a table of the values that differ between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSpec {
    /// Human-readable name for this scenario
    pub name: String,

    /// Values substituted into `${name}` placeholders
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Ordered list of steps to execute
    pub steps: Vec<Step>,

    /// One run per entry; variables here override the scenario's
    #[serde(default)]
    pub variations: Vec<Variation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    pub name: String,

    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// A scenario with one variation applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRun {
    pub name: String,
    pub variables: HashMap<String, String>,
    pub steps: Vec<Step>,
}

impl ScenarioSpec {
    /// Expand the variation table into concrete runs.
    pub fn runs(&self) -> Vec<ScenarioRun> {
        if self.variations.is_empty() {
            return vec![ScenarioRun {
                name: self.name.clone(),
                variables: self.variables.clone(),
                steps: self.steps.clone(),
            }];
        }

        self.variations
            .iter()
            .map(|variation| {
                let mut variables = self.variables.clone();
                variables.extend(variation.variables.clone());
                ScenarioRun {
                    name: format!("{} [{}]", self.name, variation.name),
                    variables,
                    steps: self.steps.clone(),
                }
            })
            .collect()
    }
}

/// A single step in a scenario.
///
/// `target` lists are ordered selector candidates: the first visible one
/// wins, so put the most specific selector first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Scroll to an element and tap it
    Tap { target: Vec<Selector> },

    /// Scroll to a text field and type into it
    Fill {
        target: Vec<Selector>,
        value: String,
        #[serde(default = "default_true")]
        verify: bool,
    },

    /// Open a dropdown and pick an option
    Select {
        target: Vec<Selector>,
        #[serde(default)]
        option: Option<String>,
        #[serde(default)]
        match_mode: MatchMode,
    },

    /// Scroll until an element is visible
    ScrollTo {
        target: Vec<Selector>,
        #[serde(default)]
        max_scrolls: Option<u32>,
    },

    /// Scroll to the end of the page, or until an element shows
    ScrollToEnd {
        #[serde(default)]
        until: Option<Vec<Selector>>,
    },

    HideKeyboard,

    /// Fixed pause for a known animation
    Wait { duration_ms: u64 },

    /// Poll (without scrolling) until an element is visible
    WaitFor {
        target: Vec<Selector>,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// An element is visible on the current screen
    AssertVisible { target: Vec<Selector> },

    /// An element's text contains the expected string
    AssertText {
        target: Vec<Selector>,
        expected: String,
    },

    /// Validation hints are (or are not) on screen.
    /// Uses the configured probes when `probes` is empty.
    AssertValidation {
        #[serde(default)]
        probes: Vec<Selector>,
        expect_messages: bool,
    },

    Screenshot { name: String },
}

fn default_true() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    10_000
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
}

impl MatchMode {
    pub fn option_match(&self, text: String) -> OptionMatch {
        match self {
            MatchMode::Exact => OptionMatch::Exact(text),
            MatchMode::Contains => OptionMatch::Contains(text),
        }
    }
}

impl Step {
    pub fn action_name(&self) -> &'static str {
        match self {
            Step::Tap { .. } => "tap",
            Step::Fill { .. } => "fill",
            Step::Select { .. } => "select",
            Step::ScrollTo { .. } => "scroll_to",
            Step::ScrollToEnd { .. } => "scroll_to_end",
            Step::HideKeyboard => "hide_keyboard",
            Step::Wait { .. } => "wait",
            Step::WaitFor { .. } => "wait_for",
            Step::AssertVisible { .. } => "assert_visible",
            Step::AssertText { .. } => "assert_text",
            Step::AssertValidation { .. } => "assert_validation",
            Step::Screenshot { .. } => "screenshot",
        }
    }

    /// Short description for logs and reports, e.g. `fill ~First Name`.
    pub fn describe(&self) -> String {
        let target = match self {
            Step::Tap { target }
            | Step::Fill { target, .. }
            | Step::Select { target, .. }
            | Step::ScrollTo { target, .. }
            | Step::WaitFor { target, .. }
            | Step::AssertVisible { target }
            | Step::AssertText { target, .. } => target.first().map(|s| s.to_string()),
            Step::ScrollToEnd { until } => until
                .as_ref()
                .and_then(|t| t.first())
                .map(|s| s.to_string()),
            Step::Wait { duration_ms } => Some(format!("{}ms", duration_ms)),
            Step::Screenshot { name } => Some(name.clone()),
            Step::HideKeyboard | Step::AssertValidation { .. } => None,
        };
        match target {
            Some(target) => format!("{} {}", self.action_name(), target),
            None => self.action_name().to_string(),
        }
    }
}

/// How a step ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,

    /// Completed, but not as asked (e.g. a fallback dropdown option)
    Partial,

    Failed,
}

/// Result of executing a single step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    /// Step index within the scenario (0-indexed)
    pub index: usize,

    /// Step description, see [`Step::describe`]
    pub action: String,

    pub status: StepStatus,

    /// What happened, for reports
    pub detail: Option<String>,
}

/// Result of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Name of the scenario run
    pub spec_name: String,

    /// No failed steps and no execution error
    pub passed: bool,

    /// Number of steps that were executed
    pub steps_run: usize,

    pub step_outcomes: Vec<StepOutcome>,

    /// Set when the run was aborted by a driver or session failure
    pub error: Option<String>,

    /// Diagnostic files captured during the run
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl TestResult {
    pub fn partial_count(&self) -> usize {
        self.step_outcomes
            .iter()
            .filter(|o| o.status == StepStatus::Partial)
            .count()
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.step_outcomes
            .iter()
            .filter(|o| o.status == StepStatus::Failed)
    }
}
