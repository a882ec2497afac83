//! Resilient element location for flaky, scrolling mobile UIs.
//!
//! Everything here goes through a single [`Locator`], which borrows the
//! session's [`Driver`] for the duration of a test step. The locator keeps no
//! state between calls beyond the settings it was built with, so one driver
//! can be handed to successive locators freely.

use crate::driver::adapter::{Driver, Selector};
use crate::locator::model::{ScrollAttemptState, SearchPhase};
use crate::locator::settings::LocatorSettings;
use crate::trace::artifacts::ArtifactSink;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

pub mod actions;
pub mod dropdown;
pub mod field;
pub mod model;
pub mod resolver;
pub mod scroll;
pub mod settings;

pub struct Locator<'a> {
    driver: &'a mut dyn Driver,
    settings: LocatorSettings,
    trace: Option<&'a TraceLogger>,
    artifacts: Option<&'a ArtifactSink>,
    sequence: u64,
}

impl<'a> Locator<'a> {
    pub fn new(driver: &'a mut dyn Driver, settings: LocatorSettings) -> Self {
        Self {
            driver,
            settings,
            trace: None,
            artifacts: None,
            sequence: 0,
        }
    }

    /// Record search phase transitions to a JSONL trace.
    pub fn with_trace(mut self, trace: &'a TraceLogger) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Save scroll screenshots when `capture_scroll_screenshots` is set.
    pub fn with_artifacts(mut self, artifacts: &'a ArtifactSink) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    /// Direct access to the underlying driver, e.g. for diagnostics.
    pub fn driver(&mut self) -> &mut dyn Driver {
        &mut *self.driver
    }

    fn transition(
        &mut self,
        state: &mut ScrollAttemptState,
        phase: SearchPhase,
        candidates: &[Selector],
        matched: Option<&Selector>,
    ) {
        state.phase = phase;
        let Some(trace) = self.trace else {
            return;
        };

        self.sequence += 1;
        let mut event = TraceEvent::now(self.sequence, phase)
            .with_candidates(candidates)
            .with_attempts(state);
        if let Some(selector) = matched {
            event = event.with_matched(selector);
        }
        if state.gesture_failed {
            event = event.with_detail("scroll gesture failed");
        }
        trace.log(&event);
    }
}
