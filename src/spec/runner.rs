use std::time::Instant;

use tracing::{error, info, warn};

use crate::driver::adapter::Selector;
use crate::error::LocatorError;
use crate::locator::Locator;
use crate::spec::context::TestContext;
use crate::spec::spec_model::{ScenarioRun, ScenarioSpec, Step, StepOutcome, StepStatus, TestResult};
use crate::spec::template::Template;
use crate::trace::artifacts::ArtifactSink;

/// What the runner does after a step.
struct StepFlow {
    outcome: StepOutcome,

    /// Later steps depend on this one (navigation taps, waits)
    abort: bool,
}

/// Executes scenario runs step-by-step through a [`Locator`].
///
/// Field, dropdown and assertion failures are recorded and the run goes on,
/// so one bad field does not hide the state of the rest of the form.
/// Navigation failures stop the run; driver and session errors abort it with
/// `error` set. Every failure captures a screenshot and page source when an
/// artifact sink is attached.
pub struct ScenarioRunner<'a> {
    artifacts: Option<&'a ArtifactSink>,
    validation_probes: Vec<Selector>,
    token: Option<u64>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new() -> Self {
        Self {
            artifacts: None,
            validation_probes: Vec::new(),
            token: None,
        }
    }

    pub fn with_artifacts(mut self, artifacts: &'a ArtifactSink) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Probes used by `assert_validation` steps that list none.
    pub fn with_validation_probes(mut self, probes: Vec<Selector>) -> Self {
        self.validation_probes = probes;
        self
    }

    /// Fix the token behind `{{gen:...}}` values instead of using the clock.
    pub fn with_token(mut self, token: u64) -> Self {
        self.token = Some(token);
        self
    }

    /// Run every variation of a scenario.
    pub fn run_all(&self, scenario: &ScenarioSpec, locator: &mut Locator<'_>) -> Vec<TestResult> {
        scenario
            .runs()
            .iter()
            .map(|run| self.run(run, locator))
            .collect()
    }

    /// Run a single scenario run.
    pub fn run(&self, run: &ScenarioRun, locator: &mut Locator<'_>) -> TestResult {
        let mut ctx = TestContext::new();
        let token = self
            .token
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().unsigned_abs());
        let template = Template::new(&run.variables, token);

        info!(scenario = %run.name, steps = run.steps.len(), "scenario started");

        for (i, step) in run.steps.iter().enumerate() {
            ctx.current_step = i;
            let started = Instant::now();

            match self.execute_step(step, i, &template, locator) {
                Ok(flow) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    match flow.outcome.status {
                        StepStatus::Failed => {
                            warn!(step = i, action = %flow.outcome.action, elapsed_ms, "step failed");
                            self.capture_failure(&run.name, i, locator, &mut ctx);
                        }
                        _ => info!(step = i, action = %flow.outcome.action, elapsed_ms, "step done"),
                    }
                    ctx.record(flow.outcome);

                    if flow.abort {
                        return Self::finish(run, &mut ctx, i + 1, None);
                    }
                }
                Err(e) => {
                    error!(step = i, "step aborted the run: {}", e);
                    self.capture_failure(&run.name, i, locator, &mut ctx);
                    ctx.record(StepOutcome {
                        index: i,
                        action: step.describe(),
                        status: StepStatus::Failed,
                        detail: Some(e.to_string()),
                    });
                    return Self::finish(run, &mut ctx, i + 1, Some(format!("Step {} failed: {}", i, e)));
                }
            }
        }

        Self::finish(run, &mut ctx, run.steps.len(), None)
    }

    fn finish(
        run: &ScenarioRun,
        ctx: &mut TestContext,
        steps_run: usize,
        error: Option<String>,
    ) -> TestResult {
        let passed = error.is_none() && ctx.all_passed();
        info!(
            scenario = %run.name,
            passed,
            partial = ctx.partial_count(),
            failed = ctx.fail_count(),
            "scenario finished"
        );
        TestResult {
            spec_name: run.name.clone(),
            passed,
            steps_run,
            step_outcomes: std::mem::take(&mut ctx.step_outcomes),
            error,
            artifacts: ctx
                .artifacts
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }

    /// Execute a single step.
    fn execute_step(
        &self,
        step: &Step,
        index: usize,
        template: &Template<'_>,
        locator: &mut Locator<'_>,
    ) -> Result<StepFlow, LocatorError> {
        let action = step.describe();
        let outcome = |status: StepStatus, detail: String| StepOutcome {
            index,
            action: action.clone(),
            status,
            detail: Some(detail),
        };

        let flow = match step {
            Step::Tap { target } => {
                let target = template.render_selectors(target)?;
                match locator.tap_target(&target)? {
                    Some(located) => StepFlow {
                        outcome: outcome(StepStatus::Passed, format!("tapped {}", located.selector)),
                        abort: false,
                    },
                    None => StepFlow {
                        outcome: outcome(StepStatus::Failed, "element not found".into()),
                        abort: true,
                    },
                }
            }

            Step::Fill {
                target,
                value,
                verify,
            } => {
                let target = template.render_selectors(target)?;
                let value = template.render(value);
                let result = locator.fill_field(&target, &value, *verify)?;
                let (status, detail) = if result.filled {
                    (
                        StepStatus::Passed,
                        format!("filled '{}' ({} write(s))", value, result.write_attempts),
                    )
                } else if result.write_attempts == 0 {
                    (StepStatus::Failed, "field not found".to_string())
                } else {
                    (
                        StepStatus::Failed,
                        format!(
                            "expected '{}', read back '{}'",
                            value,
                            result.verified_value.unwrap_or_default()
                        ),
                    )
                };
                StepFlow {
                    outcome: outcome(status, detail),
                    abort: false,
                }
            }

            Step::Select {
                target,
                option,
                match_mode,
            } => {
                let target = template.render_selectors(target)?;
                let preferred = option
                    .as_ref()
                    .map(|o| match_mode.option_match(template.render(o)));
                let (status, detail) = match locator.select_from_dropdown(&target, preferred.as_ref())? {
                    Some(selected) if selected.matched_preferred || preferred.is_none() => {
                        (StepStatus::Passed, format!("selected '{}'", selected.label))
                    }
                    Some(selected) => (
                        StepStatus::Partial,
                        format!(
                            "'{}' not offered, selected '{}'",
                            preferred.as_ref().map(|p| p.text()).unwrap_or_default(),
                            selected.label
                        ),
                    ),
                    None => (StepStatus::Failed, "dropdown or options not found".to_string()),
                };
                StepFlow {
                    outcome: outcome(status, detail),
                    abort: false,
                }
            }

            Step::ScrollTo {
                target,
                max_scrolls,
            } => {
                let target = template.render_selectors(target)?;
                let max = max_scrolls.unwrap_or(locator.settings().max_scroll_attempts);
                let search = locator.locate_with_scroll_max(&target, max)?;
                if search.found() {
                    StepFlow {
                        outcome: outcome(
                            StepStatus::Passed,
                            format!("visible after {} scroll(s)", search.scrolls()),
                        ),
                        abort: false,
                    }
                } else {
                    StepFlow {
                        outcome: outcome(
                            StepStatus::Failed,
                            format!("not found after {} scroll(s)", search.scrolls()),
                        ),
                        abort: true,
                    }
                }
            }

            Step::ScrollToEnd { until } => {
                let until = until
                    .as_ref()
                    .map(|t| template.render_selectors(t))
                    .transpose()?;
                let end = locator.scroll_to_end(until.as_deref())?;
                let status = if end.reached {
                    StepStatus::Passed
                } else {
                    StepStatus::Failed
                };
                StepFlow {
                    outcome: outcome(status, format!("{} scroll(s)", end.scrolls)),
                    abort: false,
                }
            }

            Step::HideKeyboard => {
                let hidden = locator.hide_keyboard()?;
                let detail = if hidden { "keyboard hidden" } else { "no keyboard shown" };
                StepFlow {
                    outcome: outcome(StepStatus::Passed, detail.into()),
                    abort: false,
                }
            }

            Step::Wait { duration_ms } => {
                locator.driver().pause(*duration_ms);
                StepFlow {
                    outcome: outcome(StepStatus::Passed, format!("waited {}ms", duration_ms)),
                    abort: false,
                }
            }

            Step::WaitFor { target, timeout_ms } => {
                let target = template.render_selectors(target)?;
                if locator.wait_for(&target, *timeout_ms)? {
                    StepFlow {
                        outcome: outcome(StepStatus::Passed, "visible".into()),
                        abort: false,
                    }
                } else {
                    StepFlow {
                        outcome: outcome(
                            StepStatus::Failed,
                            format!("not visible within {}ms", timeout_ms),
                        ),
                        abort: true,
                    }
                }
            }

            Step::AssertVisible { target } => {
                let target = template.render_selectors(target)?;
                let timeout = locator.settings().probe_timeout_ms;
                let (status, detail) = match locator.resolve(&target, timeout)? {
                    Some(located) => (StepStatus::Passed, format!("{} visible", located.selector)),
                    None => (StepStatus::Failed, "not visible".to_string()),
                };
                StepFlow {
                    outcome: outcome(status, detail),
                    abort: false,
                }
            }

            Step::AssertText { target, expected } => {
                let target = template.render_selectors(target)?;
                let expected = template.render(expected);
                let (status, detail) = match locator.read_text(&target)? {
                    Some(text) if text.contains(expected.as_str()) => {
                        (StepStatus::Passed, format!("text '{}'", text))
                    }
                    Some(text) => (
                        StepStatus::Failed,
                        format!("text '{}' does not contain '{}'", text, expected),
                    ),
                    None => (StepStatus::Failed, "element not found".to_string()),
                };
                StepFlow {
                    outcome: outcome(status, detail),
                    abort: false,
                }
            }

            Step::AssertValidation {
                probes,
                expect_messages,
            } => {
                let probes = if probes.is_empty() {
                    &self.validation_probes
                } else {
                    probes
                };
                let (status, detail) = if probes.is_empty() {
                    (StepStatus::Failed, "no validation probes configured".to_string())
                } else {
                    let messages = locator.scan_validation(probes)?;
                    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
                    match (messages.is_empty(), *expect_messages) {
                        (false, true) => (StepStatus::Passed, format!("found: {}", texts.join("; "))),
                        (true, false) => (StepStatus::Passed, "no validation messages".to_string()),
                        (true, true) => (StepStatus::Failed, "expected validation messages, found none".to_string()),
                        (false, false) => (StepStatus::Failed, format!("unexpected: {}", texts.join("; "))),
                    }
                };
                StepFlow {
                    outcome: outcome(status, detail),
                    abort: false,
                }
            }

            Step::Screenshot { name } => {
                let name = template.render(name);
                let (status, detail) = match self.artifacts {
                    Some(sink) => match sink.capture_screenshot(locator.driver(), &name) {
                        Some(path) => (StepStatus::Passed, path.display().to_string()),
                        None => (StepStatus::Partial, "screenshot could not be saved".to_string()),
                    },
                    None => (StepStatus::Partial, "no artifacts directory configured".to_string()),
                };
                StepFlow {
                    outcome: outcome(status, detail),
                    abort: false,
                }
            }
        };

        Ok(flow)
    }

    fn capture_failure(
        &self,
        scenario: &str,
        step: usize,
        locator: &mut Locator<'_>,
        ctx: &mut TestContext,
    ) {
        let Some(sink) = self.artifacts else {
            return;
        };
        let name = format!("FAILED-{}-step{}", scenario, step);
        ctx.add_artifact(sink.capture_screenshot(locator.driver(), &name));
        ctx.add_artifact(sink.capture_page_source(locator.driver(), &name));
    }
}

impl Default for ScenarioRunner<'_> {
    fn default() -> Self {
        Self::new()
    }
}
