use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::driver::adapter::Selector;
use crate::error::{DriverError, LocatorError};
use crate::locator::Locator;
use crate::locator::model::{ScrollAttemptState, ScrollSearch, ScrollToEnd, SearchPhase};
use crate::trace::artifacts::sanitize_name;

/// Consecutive unchanged page fingerprints that mean the list stopped moving.
const END_OF_SCROLL_STREAK: u32 = 2;

impl Locator<'_> {
    /// Hide the soft keyboard if it is showing.
    ///
    /// Returns `Ok(false)` when there was nothing to hide. Driver errors are
    /// logged and swallowed (with the optional fallback tap) except a lost
    /// session.
    pub fn hide_keyboard(&mut self) -> Result<bool, LocatorError> {
        let shown = match self.driver.is_soft_input_shown() {
            Ok(shown) => shown,
            Err(e) if e.is_session_lost() => return Err(e.into()),
            Err(e) => {
                debug!("keyboard state unknown, hiding anyway: {}", e);
                true
            }
        };
        if !shown {
            return Ok(false);
        }

        match self.driver.hide_soft_input() {
            Ok(hidden) => {
                if hidden {
                    debug!("soft keyboard hidden");
                }
                Ok(hidden)
            }
            Err(e) if e.is_session_lost() => Err(e.into()),
            Err(e) => {
                warn!("Could not hide keyboard: {}", e);
                let Some(point) = self.settings.keyboard_fallback_tap else {
                    return Ok(false);
                };
                match self.driver.tap_point(point) {
                    Ok(()) => {
                        debug!(x = point.x, y = point.y, "keyboard dismissed by fallback tap");
                        Ok(true)
                    }
                    Err(e) if e.is_session_lost() => Err(e.into()),
                    Err(e) => {
                        warn!("Fallback keyboard tap failed: {}", e);
                        Ok(false)
                    }
                }
            }
        }
    }

    /// One configured swipe. The caller decides what a failure means.
    fn scroll_once(&mut self) -> Result<(), DriverError> {
        let viewport = self.driver.viewport()?;
        let (from, to) = self.settings.gesture.points(&viewport);
        self.driver
            .perform_swipe(from, to, self.settings.gesture.duration_ms)
    }

    /// Hide the keyboard, then swipe. The keyboard must go first: while it
    /// is open it either eats the gesture or shrinks the region it lands on.
    fn hide_keyboard_and_scroll(&mut self) -> Result<Result<(), DriverError>, LocatorError> {
        self.hide_keyboard()?;
        self.driver.pause(self.settings.keyboard_hide_delay_ms);
        match self.scroll_once() {
            Err(e) if e.is_session_lost() => Err(e.into()),
            other => Ok(other),
        }
    }

    /// Find a visible element, scrolling down between attempts.
    ///
    /// Uses `max_scroll_attempts` from the settings.
    pub fn locate_with_scroll(
        &mut self,
        candidates: &[Selector],
    ) -> Result<ScrollSearch, LocatorError> {
        let max = self.settings.max_scroll_attempts;
        self.locate_with_scroll_max(candidates, max)
    }

    /// Find a visible element, performing at most `max_scroll_attempts`
    /// scroll gestures.
    ///
    /// When the target never shows, exactly `max_scroll_attempts` gestures
    /// are made and the search ends `Exhausted` with `located: None`. A
    /// rejected gesture ends the search early the same way; a lost session
    /// is returned as an error.
    pub fn locate_with_scroll_max(
        &mut self,
        candidates: &[Selector],
        max_scroll_attempts: u32,
    ) -> Result<ScrollSearch, LocatorError> {
        if candidates.is_empty() {
            return Err(LocatorError::NoCandidates);
        }

        let label = candidates[0].to_string();
        let mut state = ScrollAttemptState::new(max_scroll_attempts);

        loop {
            self.transition(&mut state, SearchPhase::Searching, candidates, None);
            let probe_timeout = self.settings.probe_timeout_ms;
            if let Some(located) = self.resolve(candidates, probe_timeout)? {
                self.transition(
                    &mut state,
                    SearchPhase::Found,
                    candidates,
                    Some(&located.selector),
                );
                info!(
                    element = %label,
                    matched = %located.selector,
                    scrolls = state.attempts_made,
                    "element found"
                );
                return Ok(ScrollSearch {
                    located: Some(located),
                    state,
                });
            }

            if !state.can_scroll() {
                self.transition(&mut state, SearchPhase::Exhausted, candidates, None);
                warn!(
                    element = %label,
                    scrolls = state.attempts_made,
                    "element not found after scrolling"
                );
                return Ok(ScrollSearch {
                    located: None,
                    state,
                });
            }

            self.transition(&mut state, SearchPhase::Scrolling, candidates, None);
            let attempt = state.attempts_made + 1;
            self.capture_scroll_screenshot(&label, "before", attempt);

            if let Err(e) = self.hide_keyboard_and_scroll()? {
                warn!(element = %label, attempt, "scroll gesture failed, stopping: {}", e);
                state.gesture_failed = true;
                self.transition(&mut state, SearchPhase::Exhausted, candidates, None);
                return Ok(ScrollSearch {
                    located: None,
                    state,
                });
            }
            state.attempts_made = attempt;
            self.driver.pause(self.settings.scroll_settle_ms);
            self.capture_scroll_screenshot(&label, "after", attempt);
        }
    }

    /// Scroll down until `until` becomes visible, or, without a target,
    /// until the page stops changing.
    ///
    /// The end of a scrollable region is detected by the UI hierarchy dump
    /// staying identical across consecutive swipes.
    pub fn scroll_to_end(
        &mut self,
        until: Option<&[Selector]>,
    ) -> Result<ScrollToEnd, LocatorError> {
        let max = self.settings.max_scroll_attempts;
        let probe_timeout = self.settings.probe_timeout_ms;
        let mut scrolls = 0;
        let mut unchanged = 0;
        let mut last = self.page_fingerprint()?;

        loop {
            if let Some(target) = until {
                if self.resolve(target, probe_timeout)?.is_some() {
                    return Ok(ScrollToEnd {
                        reached: true,
                        scrolls,
                    });
                }
            }
            if unchanged >= END_OF_SCROLL_STREAK {
                info!(scrolls, "end of scrollable region");
                return Ok(ScrollToEnd {
                    reached: until.is_none(),
                    scrolls,
                });
            }
            if scrolls >= max {
                break;
            }

            if let Err(e) = self.hide_keyboard_and_scroll()? {
                warn!("scroll gesture failed, stopping: {}", e);
                break;
            }
            scrolls += 1;
            self.driver.pause(self.settings.scroll_settle_ms);

            let current = self.page_fingerprint()?;
            if current == last {
                unchanged += 1;
            } else {
                unchanged = 0;
                last = current;
            }
        }

        warn!(scrolls, "scroll limit reached before the end of the region");
        Ok(ScrollToEnd {
            reached: false,
            scrolls,
        })
    }

    fn page_fingerprint(&mut self) -> Result<String, LocatorError> {
        let source = self.driver.page_source()?;
        let mut hasher = Sha1::new();
        hasher.update(source.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn capture_scroll_screenshot(&mut self, label: &str, when: &str, attempt: u32) {
        if !self.settings.capture_scroll_screenshots {
            return;
        }
        let Some(artifacts) = self.artifacts else {
            return;
        };
        let name = format!("{}_{}_scroll_{}", sanitize_name(label), when, attempt);
        artifacts.capture_screenshot(&mut *self.driver, &name);
    }
}
