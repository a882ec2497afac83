use tracing::{debug, info};

use crate::driver::adapter::Selector;
use crate::error::LocatorError;
use crate::locator::Locator;
use crate::locator::model::{Located, ValidationMessage};

impl Locator<'_> {
    /// Scroll to an element and tap it.
    ///
    /// A tap that lands on a recycled view is retried after re-resolving,
    /// up to `tap_retries` times. Any other tap failure is returned.
    /// `Ok(None)` when the element never shows.
    pub fn tap_target(&mut self, candidates: &[Selector]) -> Result<Option<Located>, LocatorError> {
        let retries = self.settings.tap_retries.max(1);

        for attempt in 1..=retries {
            let search = self.locate_with_scroll(candidates)?;
            let Some(located) = search.located else {
                return Ok(None);
            };

            self.hide_keyboard()?;
            match self.driver.tap(&located.handle) {
                Ok(()) => {
                    info!(element = %located.selector, "tapped");
                    return Ok(Some(located));
                }
                Err(e) if e.is_stale() && attempt < retries => {
                    debug!(element = %located.selector, attempt, "stale element, re-resolving");
                }
                Err(e) => return Err(LocatorError::gesture("tap", e)),
            }
        }

        Ok(None)
    }

    /// Wait without scrolling until one of the candidates is visible.
    pub fn wait_for(&mut self, candidates: &[Selector], timeout_ms: u64) -> Result<bool, LocatorError> {
        Ok(self.resolve(candidates, timeout_ms)?.is_some())
    }

    /// Scroll to an element and read its text. Flutter often exposes static
    /// text only as the accessibility label, so an empty text falls back to
    /// the dropdown label attribute.
    pub fn read_text(&mut self, candidates: &[Selector]) -> Result<Option<String>, LocatorError> {
        let search = self.locate_with_scroll(candidates)?;
        let Some(located) = search.located else {
            return Ok(None);
        };

        let text = self.driver.get_text(&located.handle)?;
        if !text.is_empty() {
            return Ok(Some(text));
        }
        let attribute = self.settings.dropdown.label_attribute.clone();
        Ok(Some(
            self.driver
                .attribute(&located.handle, &attribute)?
                .unwrap_or_default(),
        ))
    }

    /// Collect visible validation hints.
    ///
    /// What counts as a validation hint is app-specific, so the probes are
    /// supplied by the caller (typically from configuration).
    pub fn scan_validation(
        &mut self,
        probes: &[Selector],
    ) -> Result<Vec<ValidationMessage>, LocatorError> {
        let attribute = self.settings.dropdown.label_attribute.clone();
        let mut messages = Vec::new();

        for probe in probes {
            let handles = match self.driver.find_all(probe) {
                Ok(handles) => handles,
                Err(e) if e.is_session_lost() => return Err(e.into()),
                Err(e) => {
                    debug!(%probe, "validation probe failed: {}", e);
                    continue;
                }
            };

            for handle in handles {
                if !self.driver.is_visible(&handle).unwrap_or(false) {
                    continue;
                }
                let mut text = self.driver.get_text(&handle).unwrap_or_default();
                if text.is_empty() {
                    text = self
                        .driver
                        .attribute(&handle, &attribute)
                        .ok()
                        .flatten()
                        .unwrap_or_default();
                }
                if !text.trim().is_empty() {
                    messages.push(ValidationMessage {
                        selector: probe.clone(),
                        text: text.trim().to_string(),
                    });
                }
            }
        }

        Ok(messages)
    }
}
